//! Plain-text summaries for the terminal.

use std::path::Path;

use printquote::cost::{
    estimated_weights, format_cost, format_print_time, format_weight, MATERIALS,
};
use printquote::delivery::{format_duration, EtaSource};
use printquote::mesh::ModelStats;
use printquote::{CheckoutItem, Quote, QuoteConfig};

pub fn print_stats(path: &Path, stats: &ModelStats) {
    println!("Model: {}", path.display());
    println!("  Volume: {:.2} cm³", stats.volume);
    println!("  Surface area: {:.2} cm²", stats.surface_area);
    println!(
        "  Dimensions: {:.1} x {:.1} x {:.1} mm",
        stats.dimensions.width, stats.dimensions.height, stats.dimensions.depth
    );
    println!("  Triangles: {}", stats.triangle_count);
}

pub fn print_quote(path: &Path, quote: &Quote, config: &QuoteConfig, item: &CheckoutItem) {
    print_stats(path, &quote.stats);

    let print = &quote.print;
    println!("\nMaterial: {} ({})", quote.material.name, quote.material.category.as_str());
    println!(
        "Settings: {:.0}% infill, {} mm layers ({}), {:.0} mm/s ({})",
        print.infill_percentage,
        print.layer_height,
        print.quality_label(),
        print.print_speed,
        print.speed_label()
    );

    let cost = &quote.cost;
    let basis = match cost.details.hourly_rate {
        Some(rate) => format!("{}/hour", format_cost(rate)),
        None => cost
            .details
            .tier
            .map(|tier| tier.label().to_string())
            .unwrap_or_default(),
    };
    println!("\nCost ({} pricing):", print.pricing_mode.as_str());
    println!("  Material: {}", format_cost(cost.material_cost));
    println!("  Printing: {} ({})", format_cost(cost.printing_cost), basis);
    println!("  Support: {}", format_cost(cost.support_cost));
    if cost.details.minimum_applied {
        println!("  Minimum charge applied: {}", format_cost(cost.details.minimum_cost));
    }
    match quote.delivery_cost {
        Some(charge) => println!("  Delivery: {}", format_cost(charge)),
        None => println!("  Delivery: calculated at checkout"),
    }
    println!("  Total: {}", format_cost(cost.total_cost));
    println!("  Weight: {}", format_weight(cost.weight_grams));
    println!("  Print time: {}", format_print_time(cost.print_time_hours));

    let eta = &quote.eta;
    println!(
        "\nDelivery: {} (in {}, {})",
        config.delivery.delivery_date_label(eta),
        format_duration(eta.total_days),
        quote.urgency().label()
    );
    match &eta.source {
        EtaSource::Address { location_info, .. } => println!("  Shipping to: {location_info}"),
        EtaSource::Geolocation { distance_km, .. } => {
            println!("  Shipping distance: {distance_km:.0} km")
        }
        EtaSource::Fallback { reason: Some(reason) } => {
            println!("  Standard shipping ({reason})")
        }
        EtaSource::Fallback { reason: None } => println!("  Standard shipping"),
    }

    println!("\nCheckout: {} x{}", item.product_name, item.quantity);
    println!("  {}", item.description);
}

pub fn print_materials(volume: Option<f64>) {
    match volume {
        Some(volume) => {
            println!("Estimated weight for {volume:.2} cm³:");
            for (material, grams) in estimated_weights(volume) {
                println!("  {:<8} {:>10}", material.name, format_weight(grams));
            }
        }
        None => {
            for material in MATERIALS.iter() {
                println!(
                    "  {:<8} {:<10} ${:>5.2}/kg  {}",
                    material.id,
                    material.category.as_str(),
                    material.price_per_kg,
                    material.description
                );
            }
        }
    }
}
