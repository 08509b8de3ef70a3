//! Page geometry and pagination settings

use crate::error::PageError;
use crate::measure::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};

/// Edge of the page that carries the page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageNumberPosition {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageNumberAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Page number chrome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageNumberConfig {
    pub show: bool,
    /// Render "N of M" instead of "N"
    pub show_count: bool,
    pub show_on_first_page: bool,
    pub position: PageNumberPosition,
    pub alignment: PageNumberAlignment,
}

impl Default for PageNumberConfig {
    fn default() -> Self {
        Self {
            show: true,
            show_count: false,
            show_on_first_page: true,
            position: PageNumberPosition::Bottom,
            alignment: PageNumberAlignment::Center,
        }
    }
}

/// Page geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub header_height: f32,
    pub footer_height: f32,
    pub page_numbers: PageNumberConfig,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_width: 816.0,   // 8.5" at 96 DPI
            page_height: 1056.0, // 11" at 96 DPI
            margin_top: 96.0,
            margin_bottom: 96.0,
            margin_left: 96.0,
            margin_right: 96.0,
            header_height: 30.0,
            footer_height: 30.0,
            page_numbers: PageNumberConfig::default(),
        }
    }
}

impl PageLayout {
    /// Layout without header or footer chrome
    pub fn plain(page_width: f32, page_height: f32, margin: f32) -> Self {
        Self {
            page_width,
            page_height,
            margin_top: margin,
            margin_bottom: margin,
            margin_left: margin,
            margin_right: margin,
            page_numbers: PageNumberConfig {
                show: false,
                ..PageNumberConfig::default()
            },
            ..Self::default()
        }
    }

    /// Usable content width
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Height budget for page content. The header is reserved when page numbers
    /// sit at the top, the footer when they sit at the bottom.
    pub fn content_height(&self) -> f32 {
        let chrome = match (self.page_numbers.show, self.page_numbers.position) {
            (true, PageNumberPosition::Top) => self.header_height,
            (true, PageNumberPosition::Bottom) => self.footer_height,
            (false, _) => 0.0,
        };
        self.page_height - self.margin_top - self.margin_bottom - chrome
    }

    pub fn validate(&self) -> Result<(), PageError> {
        positive("page_width", self.page_width)?;
        positive("page_height", self.page_height)?;
        for (field, value) in [
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
            ("header_height", self.header_height),
            ("footer_height", self.footer_height),
        ] {
            non_negative(field, value)?;
        }
        positive("content_width", self.content_width())?;
        positive("content_height", self.content_height())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), PageError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PageError::InvalidConfig { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), PageError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PageError::InvalidConfig { field, value })
    }
}

/// Settings of one engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    pub layout: PageLayout,
    /// Overrides the measured height of an empty paragraph
    pub default_block_height: Option<f32>,
    /// Entries kept per measurement table
    pub cache_capacity: usize,
    /// Divisor estimating which page a position falls on
    pub positions_per_page: usize,
    /// Let paragraphs taller than one default block split mid-text even when
    /// they would fit an empty page
    pub eager_paragraph_split: bool,
    /// Upper bound on page splits in one pass
    pub max_splits_per_pass: usize,
    /// Height a fixed block contributes on its own
    pub fixed_block_chrome: f32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            layout: PageLayout::default(),
            default_block_height: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            positions_per_page: 1000,
            eager_paragraph_split: false,
            max_splits_per_pass: 512,
            fixed_block_chrome: 8.0,
        }
    }
}

impl PaginationConfig {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), PageError> {
        self.layout.validate()?;
        if self.cache_capacity == 0 {
            return Err(PageError::ZeroCacheCapacity);
        }
        if let Some(height) = self.default_block_height {
            positive("default_block_height", height)?;
        }
        positive("positions_per_page", self.positions_per_page as f32)?;
        positive("max_splits_per_pass", self.max_splits_per_pass as f32)?;
        non_negative("fixed_block_chrome", self.fixed_block_chrome)
    }
}
