use std::fmt;
use std::str::FromStr;

/// Kind of shape a detection capability reports.
///
/// The derived ordering is the overlay priority: faces are drawn first,
/// then text, then barcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Face,
    Text,
    Barcode,
}

impl Category {
    pub const PRIORITY: [Category; 3] = [Category::Face, Category::Text, Category::Barcode];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Face => "face",
            Category::Text => "text",
            Category::Barcode => "barcode",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "face" | "faces" => Ok(Category::Face),
            "text" => Ok(Category::Text),
            "barcode" | "barcodes" => Ok(Category::Barcode),
            other => Err(format!(
                "unknown detection category '{other}' (expected face, text or barcode)"
            )),
        }
    }
}
