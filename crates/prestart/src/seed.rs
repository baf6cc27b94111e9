//! Catalogue of seed-data loaders, in the order they must run.
//!
//! Later loaders reference rows created by earlier ones (product details
//! need products, the points mall needs points accounts), so the order is
//! fixed here rather than configurable.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedLoader {
    Initial,
    Region,
    HotSearch,
    Product,
    ProductDetail,
    DataPackages,
    MembershipBenefits,
    Coupon,
    Points,
    Discovery,
    ServiceAccount,
    PointsMall,
}

impl SeedLoader {
    /// Every loader, in run order.
    pub const ALL: [SeedLoader; 12] = [
        Self::Initial,
        Self::Region,
        Self::HotSearch,
        Self::Product,
        Self::ProductDetail,
        Self::DataPackages,
        Self::MembershipBenefits,
        Self::Coupon,
        Self::Points,
        Self::Discovery,
        Self::ServiceAccount,
        Self::PointsMall,
    ];

    /// Stable kebab-case identifier.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Region => "region",
            Self::HotSearch => "hot-search",
            Self::Product => "product",
            Self::ProductDetail => "product-detail",
            Self::DataPackages => "data-packages",
            Self::MembershipBenefits => "membership-benefits",
            Self::Coupon => "coupon",
            Self::Points => "points",
            Self::Discovery => "discovery",
            Self::ServiceAccount => "service-account",
            Self::PointsMall => "points-mall",
        }
    }

    /// Step name used in traces, e.g. `seed-hot-search`.
    pub fn step_name(self) -> String {
        format!("seed-{}", self.slug())
    }

    /// Render a command template. `{loader}` becomes the slug and
    /// `{loader_snake}` the slug with underscores.
    pub fn render_command(self, template: &str) -> String {
        template
            .replace("{loader_snake}", &self.slug().replace('-', "_"))
            .replace("{loader}", self.slug())
    }
}

impl fmt::Display for SeedLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
