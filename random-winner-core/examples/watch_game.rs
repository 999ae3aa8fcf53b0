use random_winner_core::{
    DappConfig, GameActions, SessionManager, SubgraphClient, ViewEvent, ViewStore, ViewSync,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let contract = std::env::args()
        .nth(1)
        .ok_or("usage: watch_game <contract address>")?
        .parse()?;
    let config = DappConfig::new(contract);
    config.validate()?;

    let session = Arc::new(SessionManager::from_config(&config)?);
    let account = session.connect().await?;
    println!("Connected as {}", account);

    let store = ViewStore::new();
    store.dispatch(ViewEvent::Connected { account });

    let actions = GameActions::new(session.clone(), contract, store.clone());
    let is_owner = actions.check_owner().await?;
    println!("Owner: {}", is_owner);

    let index = Arc::new(SubgraphClient::new(config.subgraph_url.clone())?);
    let sync = Arc::new(ViewSync::new(
        session,
        index,
        contract,
        store.clone(),
        config.poll_interval(),
    ));
    let handle = sync.spawn();

    // Print the first five updates
    let mut rx = store.subscribe();
    for _ in 0..5 {
        rx.changed().await?;
        let view = rx.borrow().clone();
        for line in &view.logs {
            println!("{}", line);
        }
        println!("---");
    }

    handle.stop().await;
    println!("\nExample completed successfully!");

    Ok(())
}
