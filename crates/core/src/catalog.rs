use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::CatalogError;
use crate::models::Location;
use crate::normalize::{fold_text, tokenize};

/// Folded token sequence that identifies one catalog location.
#[derive(Debug, Clone)]
pub struct LocationNeedle {
    pub location_index: usize,
    pub tokens: Vec<String>,
}

/// Immutable list of known airports. Iteration order is catalog order and is
/// what breaks ties between locations sharing an alias.
#[derive(Debug, Clone)]
pub struct LocationCatalog {
    locations: Vec<Location>,
    needles: Vec<LocationNeedle>,
}

impl LocationCatalog {
    pub fn new(locations: Vec<Location>) -> Result<Self, CatalogError> {
        if locations.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(locations.len());

        for mut location in locations {
            let code = location.code.trim().to_uppercase();
            if code.is_empty() {
                return Err(CatalogError::BlankCode {
                    city: location.city,
                });
            }
            if !seen.insert(code.clone()) {
                return Err(CatalogError::DuplicateCode(code));
            }
            location.code = code;
            normalized.push(location);
        }

        Ok(Self::from_trusted(normalized))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let locations: Vec<Location> = serde_json::from_str(raw)?;
        Self::new(locations)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|source| CatalogError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Domestic Vietnamese airports plus a few regional hubs.
    pub fn builtin() -> Self {
        Self::from_trusted(builtin_locations())
    }

    fn from_trusted(locations: Vec<Location>) -> Self {
        let needles = build_needles(&locations);
        Self { locations, needles }
    }

    pub fn get(&self, code: &str) -> Option<&Location> {
        let code = code.trim();
        self.locations
            .iter()
            .find(|location| location.code.eq_ignore_ascii_case(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn needles(&self) -> &[LocationNeedle] {
        &self.needles
    }
}

fn build_needles(locations: &[Location]) -> Vec<LocationNeedle> {
    let mut needles = Vec::new();

    for (location_index, location) in locations.iter().enumerate() {
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let names = std::iter::once(&location.code)
            .chain(std::iter::once(&location.city))
            .chain(location.aliases.iter());

        for name in names {
            let folded = fold_text(name);
            let tokens = tokenize(&folded)
                .into_iter()
                .map(|token| token.text.to_string())
                .collect::<Vec<_>>();
            if tokens.is_empty() || !seen.insert(tokens.clone()) {
                continue;
            }
            needles.push(LocationNeedle {
                location_index,
                tokens,
            });
        }
    }

    needles
}

fn builtin_locations() -> Vec<Location> {
    vec![
        Location::new(
            "SGN",
            "Hồ Chí Minh",
            &[
                "TP Hồ Chí Minh",
                "Sài Gòn",
                "Saigon",
                "TP HCM",
                "HCM",
                "Tân Sơn Nhất",
                "Ho Chi Minh City",
            ],
        ),
        Location::new("HAN", "Hà Nội", &["Hanoi", "Nội Bài", "Thủ đô"]),
        Location::new("DAD", "Đà Nẵng", &["Danang"]),
        Location::new("CXR", "Nha Trang", &["Cam Ranh", "Khánh Hòa"]),
        Location::new("PQC", "Phú Quốc", &["Phu Quoc Island", "Kiên Giang"]),
        Location::new("HPH", "Hải Phòng", &["Cát Bi", "Haiphong"]),
        Location::new("HUI", "Huế", &["Phú Bài", "Hue City"]),
        Location::new("VCA", "Cần Thơ", &["Can Tho City"]),
        Location::new("DLI", "Đà Lạt", &["Liên Khương", "Lâm Đồng", "Dalat"]),
        Location::new("UIH", "Quy Nhơn", &["Phù Cát", "Bình Định"]),
        Location::new("VII", "Vinh", &["Nghệ An"]),
        Location::new("BMV", "Buôn Ma Thuột", &["Buôn Mê Thuột", "Đắk Lắk"]),
        Location::new("VDO", "Vân Đồn", &["Quảng Ninh", "Hạ Long"]),
        Location::new("THD", "Thanh Hóa", &["Thọ Xuân"]),
        Location::new("VCS", "Côn Đảo", &["Con Dao Island"]),
        Location::new("PXU", "Pleiku", &["Gia Lai"]),
        Location::new("TBB", "Tuy Hòa", &["Phú Yên"]),
        Location::new("VCL", "Chu Lai", &["Quảng Nam", "Tam Kỳ"]),
        Location::new("DIN", "Điện Biên Phủ", &["Điện Biên"]),
        Location::new("VKG", "Rạch Giá", &[]),
        Location::new("CAH", "Cà Mau", &[]),
        Location::new("BKK", "Bangkok", &["Băng Cốc", "Suvarnabhumi"]),
        Location::new("SIN", "Singapore", &["Changi"]),
        Location::new("ICN", "Seoul", &["Incheon"]),
        Location::new("NRT", "Tokyo", &["Narita"]),
        Location::new("KUL", "Kuala Lumpur", &[]),
    ]
}
