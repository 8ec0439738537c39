//! The fixed table of selectable cities

use itertools::Itertools;

/// A selectable city: the Arabic label shown in the selector, plus the
/// canonical name the timings API recognizes
#[derive(Debug, Eq, PartialEq)]
pub struct City {
    pub label: &'static str,
    /// Sent verbatim as the `city` query parameter
    pub id: &'static str,
}

/// Every city the widget can show, in selector order. Selection cycles
/// through this table; nothing is added or removed at runtime.
pub static CITIES: [City; 27] = [
    City { label: "القاهرة", id: "Cairo" },
    City { label: "الإسكندرية", id: "Alexandria" },
    City { label: "الجيزة", id: "Giza" },
    City { label: "بورسعيد", id: "Port Said" },
    City { label: "السويس", id: "Suez" },
    City { label: "المنصورة", id: "Mansoura" },
    City { label: "الزقازيق", id: "Zagazig" },
    City { label: "أسيوط", id: "Asyut" },
    City { label: "أسوان", id: "Aswan" },
    City { label: "الأقصر", id: "Luxor" },
    City { label: "الفيوم", id: "Faiyum" },
    City { label: "طنطا", id: "Tanta" },
    City { label: "دمياط", id: "Damietta" },
    City { label: "المنيا", id: "Minya" },
    City { label: "بني سويف", id: "Beni Suef" },
    City { label: "قنا", id: "Qena" },
    City { label: "كفر الشيخ", id: "Kafr El Sheikh" },
    City { label: "دمنهور", id: "Damanhur" },
    City { label: "العريش", id: "Arish" },
    City { label: "مرسى مطروح", id: "Marsa Matruh" },
    City { label: "الإسماعيلية", id: "Ismailia" },
    City { label: "شبين الكوم", id: "Shibin El Kom" },
    City { label: "بنها", id: "Banha" },
    City { label: "الغردقة", id: "Hurghada" },
    City { label: "6 أكتوبر", id: "6th of October" },
    City { label: "العبور", id: "Obour" },
    City { label: "سوهاج", id: "Sohag" },
];

impl City {
    /// Index of this city in [CITIES]. The table is tiny, so a linear scan
    /// each time is fine.
    fn position(&self) -> usize {
        CITIES
            .iter()
            .find_position(|city| city.id == self.id)
            .map(|(position, _)| position)
            .unwrap_or(0)
    }

    /// The city after this one, wrapping at the end of the table
    pub fn next(&self) -> &'static City {
        &CITIES[(self.position() + 1) % CITIES.len()]
    }

    /// The city before this one, wrapping at the start of the table
    pub fn prev(&self) -> &'static City {
        &CITIES[(self.position() + CITIES.len() - 1) % CITIES.len()]
    }
}
