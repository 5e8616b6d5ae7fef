use std::path::Path;

use crate::app::{AppContext, Result, ScoutError};
use crate::config::Config;
use crate::domain::{LookupRequest, LyricResult};
use crate::server;

pub async fn lookup(ctx: &AppContext, title: &str, json: bool) -> Result<()> {
    let request = LookupRequest::new(title)?;
    let result = ctx.dispatcher.acquire_default(&request).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| ScoutError::Other(e.to_string()))?;
        println!("{}", rendered);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &LyricResult) {
    println!("{} - {}", result.artist, result.song_title);
    println!("{}", result.source_url);
    println!();
    println!("{}", result.lyrics);
}

pub async fn serve(ctx: &AppContext) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);

    server::serve(&addr, ctx.dispatcher.clone(), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

pub fn show_config(config: &Config, path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path()?,
    };

    println!("Config file: {}", path.display());
    println!("Mode:        {}", config.acquisition.mode);
    let api = config
        .api
        .search_base()
        .map(|u| u.to_string())
        .unwrap_or_else(|e| format!("{} (invalid: {})", config.api.base_url, e));
    println!("API:         {}", api);
    println!(
        "Token:       {}",
        if config.api.credential().is_some() { "set" } else { "not set" }
    );
    println!("Search:      {}", config.scraper.search_url);
    println!("Listen:      {}:{}", config.server.host, config.server.port);
    Ok(())
}
