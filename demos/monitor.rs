use std::env;
use std::time::Duration;

use moneta_thermostat::{MonetaClient, display_target, operating_mode, preset_for, weekly_summary};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let token = args.get(1).cloned().unwrap_or_else(|| {
        env::var("MONETA_TOKEN").expect("usage: monitor <access-token> [interval-minutes]")
    });
    let interval: u64 = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(10);

    let client = MonetaClient::builder(token)
        .polling_interval_minutes(interval)
        .build();

    match client.verify_connection().await {
        Ok(unit) => println!("Connected to unit {unit}. Polling for updates..."),
        Err(e) => {
            eprintln!("Connection check failed: {e}");
            return;
        }
    }

    loop {
        match client.get_state().await {
            Some(state) => {
                println!(
                    "Unit {} | {:?} | outdoor {:.1}\u{00b0}{}",
                    state.unit_code, state.category, state.external_temperature, state.measure_unit,
                );
                for (index, zone) in state.zones.iter().enumerate() {
                    let name = client.zone_display_name(index, &zone.id);
                    let mode = operating_mode(zone, state.season.id);
                    let target = display_target(zone, state.season.id, &state.limits);
                    print!(
                        "[{name}] {:.1}\u{00b0}{} -> {target:.1}\u{00b0}{} | mode: {mode:?}",
                        zone.temperature, state.measure_unit, state.measure_unit,
                    );
                    if let Some(preset) = preset_for(zone) {
                        print!(" ({})", preset.label());
                    }
                    if let Some(humidity) = zone.humidity {
                        print!(" | {humidity:.0}%");
                    }
                    println!();
                    if let Some(calendar) = &zone.calendar {
                        let summary = weekly_summary(&calendar.schedule);
                        if !summary.is_empty() {
                            println!("  schedule: {summary}");
                        }
                    }
                }
            }
            None => eprintln!("Refresh failed; retrying on the next cycle"),
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}
