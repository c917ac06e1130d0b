use async_trait::async_trait;
use color_eyre::eyre::Result;
use tokio::sync::watch;

/// Arguments of one page fetch. Serialises as a single flat object,
/// `{limit, ...filter, ...cursor}`; first pages carry no cursor fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PageRequest<F, C> {
    pub limit: usize,
    #[serde(flatten)]
    pub filter: F,
    #[serde(flatten)]
    pub cursor: Option<C>,
}

/// A cursor-paginated list resource.
///
/// `Filter` selects *which* list is loaded; two filters that compare unequal
/// are different lists and force a reset. `Cursor` is derived from the last
/// item already loaded and asks for the page after it.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Filter: Clone + PartialEq + Send + Sync + 'static;
    type Cursor: Send + 'static;

    async fn fetch_page(
        &self,
        request: PageRequest<Self::Filter, Self::Cursor>,
    ) -> Result<Vec<Self::Item>>;

    fn cursor_after(&self, last: &Self::Item) -> Self::Cursor;
}

/// Geometry of a scrollable container, in whatever unit it lays rows out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_height: u32,
    pub client_height: u32,
    pub scroll_top: u32,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> u32 {
        self.scroll_height
            .saturating_sub(self.client_height)
            .saturating_sub(self.scroll_top)
    }

    /// `false` when the content is too short to scroll.
    pub fn overflows(&self) -> bool {
        self.scroll_height > self.client_height
    }
}

pub trait ScrollContainer: Send + Sync {
    /// Scroll events. Every change of the value is one event carrying the
    /// container's geometry at that moment.
    fn subscribe(&self) -> watch::Receiver<ScrollMetrics>;

    /// Geometry the container will have once it holds `rows` items.
    fn layout(&self, rows: usize) -> ScrollMetrics;
}
