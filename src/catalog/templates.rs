use crate::model::{CatalogEntry, OwnershipRecord};

/// Fixed content for one catalog sneaker. Identity and edition are assigned
/// at seed time.
pub struct SneakerTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub image_url: &'static str,
    pub gallery: &'static [&'static str],
    /// `(id, owner name, date)` in chronological order.
    pub history: &'static [(&'static str, &'static str, &'static str)],
}

impl SneakerTemplate {
    pub fn instantiate(&self, id: String, manufacture_number: String) -> CatalogEntry {
        CatalogEntry {
            id,
            name: self.name.to_string(),
            description: self.description.to_string(),
            image_url: self.image_url.to_string(),
            gallery: self.gallery.iter().map(|url| url.to_string()).collect(),
            history: self
                .history
                .iter()
                .map(|(id, name, date)| OwnershipRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                    date: date.to_string(),
                })
                .collect(),
            manufacture_number,
        }
    }
}

pub const TEMPLATES: &[SneakerTemplate] = &[
    SneakerTemplate {
        name: "Air Jordan 1",
        description: "Classic basketball sneaker",
        image_url: "https://m.media-amazon.com/images/I/71n-Dh2kDXL._AC_SX575_.jpg",
        gallery: &[
            "https://m.media-amazon.com/images/I/71pixFge+uL._AC_SX575_.jpg",
            "https://m.media-amazon.com/images/I/71n-Dh2kDXL._AC_SX575_.jpg",
            "https://m.media-amazon.com/images/I/71Nq2C31XrL._AC_SX575_.jpg",
        ],
        history: &[
            ("1", "John Doe", "2025-03-01"),
            ("2", "Jane Smith", "2025-03-05"),
        ],
    },
    SneakerTemplate {
        name: "Nike Air Max 90",
        description: "Iconic running shoe",
        image_url: "https://dks.scene7.com/is/image/GolfGalaxy/19NIKMRMX90WHTGRYMNS_Gry_Wht_Smoke_Gry_Blk?qlt=70&wid=500&fmt=webp&op_sharpen=1",
        gallery: &[
            "https://dks.scene7.com/is/image/GolfGalaxy/19NIKMRMX90WHTGRYMNS_Gry_Wht_Smoke_Gry_Blk?qlt=70&wid=500&fmt=webp&op_sharpen=1",
            "https://dks.scene7.com/is/image/GolfGalaxy/CN8490002_GryWhtSmokeGryBlk_SL?qlt=70&wid=500&fmt=webp&op_sharpen=1",
            "https://dks.scene7.com/is/image/GolfGalaxy/CN8490002_GryWhtSmokeGryBlk_INS?qlt=70&wid=500&fmt=webp&op_sharpen=1",
        ],
        history: &[
            ("3", "Josh Johnson", "2025-03-10"),
            ("4", "Bob Brown", "2025-03-15"),
        ],
    },
    SneakerTemplate {
        name: "Adidas Yeezy Boost 350",
        description: "Popular collector sneaker",
        image_url: "https://m.media-amazon.com/images/I/41xCjNHrYHL._AC_SY695_.jpg",
        gallery: &[
            "https://m.media-amazon.com/images/I/514b5as3MSL._AC_SY695_.jpg",
            "https://m.media-amazon.com/images/I/51bV6jB1RSL._AC_SY695_.jpg",
            "https://m.media-amazon.com/images/I/51bV6jB1RSL._AC_SY695_.jpg",
        ],
        history: &[
            ("5", "Jane Doe", "2025-03-20"),
            ("6", "John Smith", "2025-03-25"),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_preserves_order() {
        let entry = TEMPLATES[0].instantiate("id-1".into(), "Limited Edition 1/100 Release".into());
        assert_eq!(entry.gallery.len(), 3);
        assert_eq!(entry.gallery[0], TEMPLATES[0].gallery[0]);
        assert_eq!(entry.gallery[2], TEMPLATES[0].gallery[2]);
        let owners: Vec<&str> = entry.history.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(owners, vec!["John Doe", "Jane Smith"]);
    }

    #[test]
    fn templates_are_fully_populated() {
        for template in TEMPLATES {
            assert!(!template.name.is_empty());
            assert!(!template.description.is_empty());
            assert!(!template.image_url.is_empty());
            assert!(!template.gallery.is_empty());
            assert!(!template.history.is_empty());
        }
    }
}
