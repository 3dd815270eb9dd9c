//! Nearby articles on a console "map"
//!
//! This example demonstrates a full discovery session against the live
//! endpoints:
//! - Resolving a place name to a search centre
//! - Rendering markers and the list view from one result set
//! - Narrowing the search by category and radius
//! - Selecting an article the way a marker click would
//!
//! Run with `cargo run --example console_map -- "Trafalgar Square"`.

use std::sync::Arc;

use nearby::{
    ArticleId, Category, Coordinate, DiscoveryConfig, HttpContentClient, ListOrder, MapSurface,
    ResultSet, SearchCoordinator,
};
use tracing::Level;

/// Prints what a map widget would draw.
struct ConsoleMap;

impl MapSurface for ConsoleMap {
    fn set_center(&self, center: Coordinate, zoom: u8) {
        println!("[map] centred on {center} at zoom {zoom}");
    }

    fn render_markers(&self, results: &ResultSet) {
        println!("[map] {} markers", results.len());
    }

    fn focus_marker(&self, id: ArticleId) {
        println!("[map] focus marker {id}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    nearby::init_logging(Level::WARN)?;

    let place = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Trafalgar Square".to_string());

    let config = DiscoveryConfig::builder().radius(2_000).limit(10).build();
    let content = Arc::new(HttpContentClient::new(config.endpoints.clone())?);
    let mut coordinator = SearchCoordinator::new(content, ConsoleMap, config);

    println!("Searching around {place:?}:");
    coordinator.set_location_by_place_name(&place).await?;
    coordinator.settle().await;
    print_list(&coordinator);

    println!("\nOnly history, within 1 km:");
    coordinator.set_category(Category::History);
    coordinator.set_radius(1_000);
    coordinator.settle().await;
    print_list(&coordinator);

    if let Some(first) = coordinator.results().and_then(|r| r.first()).map(|a| a.id) {
        println!("\nClicking marker {first}:");
        coordinator.activation_port().marker_activated(first);
        coordinator.next_update().await;
        coordinator.set_list_order(ListOrder::Name);
        print_list(&coordinator);
    }

    Ok(())
}

fn print_list<C, M>(coordinator: &SearchCoordinator<C, M>)
where
    C: nearby::ContentSource + ?Sized + 'static,
    M: MapSurface,
{
    let view = coordinator.bridge().current_view();
    if let Some(notice) = &view.notice {
        println!("  ! {}", notice.message);
    }
    for article in view.entries() {
        let marker = if view.is_selected(article.id) { ">" } else { " " };
        println!(
            "{marker} {:>6.0} m {:<2} {} [{:?}]",
            article.distance_meters,
            article.direction.as_str(),
            article.title,
            article.group(),
        );
        if let Some(preview) = article.preview(80) {
            println!("           {preview}");
        }
    }
}
