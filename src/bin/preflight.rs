use sqlx::Row;
use web_widget::app::data_layer::{release, WIDGET_PROCEDURES};
use web_widget::{Config, DataLayer};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads the same settings as api_server:\n\
           WIDGET_ENV, DATABASE_URL, DB_CONNECT_TIMEOUT_SECS, DB_COMMAND_TIMEOUT_SECS\n\
         and checks that the database is reachable and defines every widget procedure.\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let config = Config::from_env()?;
    println!("> Preflight:");
    println!("  WIDGET_ENV={:?}", config.mode);
    println!("  connect timeout={:?} command timeout={:?}", config.connect_timeout, config.command_timeout);

    let data_layer = DataLayer::from_config(&config)?;
    let mut conn = data_layer.connect().await?;
    println!("  Database reachable.");

    let result = sqlx::query("SELECT proname::text AS proname FROM pg_proc WHERE proname::text = ANY($1)")
        .bind(WIDGET_PROCEDURES)
        .fetch_all(&mut conn)
        .await;
    release(conn).await;

    let present: Vec<String> = result?
        .into_iter()
        .filter_map(|r| r.try_get::<String, _>("proname").ok())
        .collect();

    let missing: Vec<&str> = WIDGET_PROCEDURES
        .iter()
        .copied()
        .filter(|name| !present.iter().any(|p| p == name))
        .collect();
    for name in WIDGET_PROCEDURES {
        let mark = if missing.contains(name) { "MISSING" } else { "ok" };
        println!("  {:<16} {}", name, mark);
    }

    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "Missing stored procedures: {} (see sql/widget_procedures.sql)",
            missing.join(", ")
        ));
    }

    println!("> Preflight OK.");
    Ok(())
}
