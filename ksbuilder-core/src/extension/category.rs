//! Marketplace categories

/// A marketplace category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Value to use for `category` in extension.yaml
    pub normalized_name: &'static str,

    /// English display name
    pub display_name_en: &'static str,

    /// Chinese display name
    pub display_name_zh: &'static str,
}

/// Categories accepted by the marketplace
pub const CATEGORIES: &[Category] = &[
    Category {
        normalized_name: "ai-machine-learning",
        display_name_en: "AI / Machine Learning",
        display_name_zh: "AI / 机器学习",
    },
    Category {
        normalized_name: "database",
        display_name_en: "Database",
        display_name_zh: "数据库",
    },
    Category {
        normalized_name: "integration-delivery",
        display_name_en: "Integration & Delivery",
        display_name_zh: "集成交付",
    },
    Category {
        normalized_name: "monitoring-logging",
        display_name_en: "Observability",
        display_name_zh: "可观测性",
    },
    Category {
        normalized_name: "networking",
        display_name_en: "Networking",
        display_name_zh: "网络",
    },
    Category {
        normalized_name: "security",
        display_name_en: "Security",
        display_name_zh: "安全",
    },
    Category {
        normalized_name: "storage",
        display_name_en: "Storage",
        display_name_zh: "存储",
    },
    Category {
        normalized_name: "streaming-messaging",
        display_name_en: "Streaming & Messaging",
        display_name_zh: "流处理与消息队列",
    },
];

/// Find a category by its normalized name
pub fn find_category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.normalized_name == name)
}
