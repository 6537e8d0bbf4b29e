use market_list_sdk::sources::CoinGeckoSource;
use market_list_sdk::{
    ContainerConfig, DisplayField, DisplayValue, FixedCurrency, Formatter, MarketListContainer,
    Currency, ViewState,
};
use std::sync::Arc;

fn print_state(state: &ViewState) {
    match state {
        ViewState::Loading => println!("Loading..."),
        ViewState::Error(message) => println!("Error: {}", message),
        ViewState::Data(items) => {
            println!("\n{:-<60}", "");
            for item in items.iter().take(15) {
                let value = match &item.value {
                    DisplayValue::MarketCap(text) | DisplayValue::Volume(text) => text.clone(),
                    DisplayValue::PriceChange(Some(change)) => format!("{:.2}%", change),
                    DisplayValue::PriceChange(None) => "---".to_string(),
                };
                println!(
                    "{:>4} {:<8} {:<18} {}",
                    item.rank, item.coin_code, item.coin_rate, value
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Top Coins (CoinGecko)");
    println!("=====================");

    let config = ContainerConfig::from_env().with_poll_interval(None);
    println!("Category: {}", config.category);

    let container = MarketListContainer::new(
        Arc::new(CoinGeckoSource::new()?),
        Arc::new(FixedCurrency(Currency::usd())),
        Formatter::default(),
        config,
    );

    container.refresh().await;
    print_state(&container.state());

    for field in [DisplayField::Volume, DisplayField::PriceChange] {
        container.set_field(field).await;
        println!("\nField: {}", field);
        print_state(&container.state());
    }

    let metrics = container.metrics().await;
    println!(
        "\nFetches: {}, re-renders from cache: {}, fetch p50: {:.0}ms",
        metrics.fetch_count, metrics.reformat_count, metrics.fetch_latency_p50_ms
    );

    Ok(())
}
