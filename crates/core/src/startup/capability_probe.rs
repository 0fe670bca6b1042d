use crate::detection::domain::capability::Capability;
use crate::detection::domain::category::Category;

/// Which detection capabilities the host provides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    pub face: bool,
    pub text: bool,
    pub barcode: bool,
}

impl HostCapabilities {
    pub fn all() -> Self {
        Self {
            face: true,
            text: true,
            barcode: true,
        }
    }

    pub fn from_capabilities(capabilities: &[Capability]) -> Self {
        let mut host = Self::default();
        for capability in capabilities {
            match capability.category() {
                Category::Face => host.face = true,
                Category::Text => host.text = true,
                Category::Barcode => host.barcode = true,
            }
        }
        host
    }

    pub fn has(&self, category: Category) -> bool {
        match category {
            Category::Face => self.face,
            Category::Text => self.text,
            Category::Barcode => self.barcode,
        }
    }

    /// Enabled categories the host cannot serve, in priority order.
    pub fn missing(&self, enabled: &[Category]) -> Vec<Category> {
        Category::PRIORITY
            .into_iter()
            .filter(|c| enabled.contains(c) && !self.has(*c))
            .collect()
    }
}

/// True when every enabled category is available on the host.
pub fn probe(enabled: &[Category], host: &HostCapabilities) -> bool {
    enabled.iter().all(|c| host.has(*c))
}
