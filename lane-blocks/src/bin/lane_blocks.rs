//! Lane Blocks CLI - compose a demo page for a request path
//!
//! Registers a small demo site (menu, header, docs sidebar, admin panel) and
//! prints what each region would contain for the given path.
//!
//! Usage:
//!     lane-blocks /docs/setup
//!     lane-blocks --session role=admin --json /admin
//!     lane-blocks --page /
//!
//! Environment:
//!     LANE_BLOCKS_REGIONS    comma separated region names
//!     LANE_BLOCKS_MAX_DEPTH  nested region limit
//!     RUST_LOG               log filter (default: lane_blocks=info)

use std::sync::Arc;

use clap::Parser;
use lane_blocks::{
    BlockDefinition, BlockRegistry, BlocksConfig, Composer, ContentError, MenuItem,
    PlaceholderRenderer, Request, ResolvedBlock, Response, Result,
};
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lane-blocks")]
#[command(about = "Show the blocks each layout region receives for a request path")]
#[command(version)]
struct Args {
    /// Request path (may include a query string)
    #[arg(default_value = "/")]
    path: String,

    /// Session entries as key=value
    #[arg(short, long = "session", value_name = "KEY=VALUE")]
    session: Vec<String>,

    /// Only show this region
    #[arg(short, long)]
    region: Option<String>,

    /// Output resolved items as JSON
    #[arg(long)]
    json: bool,

    /// Render the whole page through the demo layout
    #[arg(long)]
    page: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lane_blocks=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config()?;
    let registry = demo_registry(config)?;
    tracing::info!("Registered {} demo block(s)", registry.len());

    let composer = Composer::new(registry.freeze(), Arc::new(demo_renderer()));

    let mut request = Request::new(args.path.clone());
    for entry in &args.session {
        match entry.split_once('=') {
            Some((key, value)) => {
                request.session.insert(key.to_string(), Value::String(value.to_string()));
            }
            None => tracing::warn!("Ignoring session entry without '=': {}", entry),
        }
    }

    let mut page = composer.begin(request, Response::new())?;

    if args.page {
        println!("{}", page.render("page")?);
        return Ok(());
    }

    let regions: Vec<String> = match &args.region {
        Some(region) => vec![region.clone()],
        None => page.region_names().to_vec(),
    };

    let mut output = Map::new();
    for region in &regions {
        let items = page.blocks_for(region)?;
        if args.json {
            output.insert(region.clone(), serde_json::to_value(&items)?);
        } else {
            print_region(region, &items);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
    }
    Ok(())
}

fn load_config() -> Result<BlocksConfig> {
    let mut builder = BlocksConfig::builder().site_title("Lane Blocks Demo");

    if let Ok(regions) = std::env::var("LANE_BLOCKS_REGIONS") {
        builder = builder.regions(
            regions
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        );
    }
    if let Some(depth) = std::env::var("LANE_BLOCKS_MAX_DEPTH")
        .ok()
        .and_then(|d| d.parse::<usize>().ok())
    {
        builder = builder.max_render_depth(depth);
    }

    builder.build()
}

fn demo_registry(config: BlocksConfig) -> Result<BlockRegistry> {
    let mut registry = BlockRegistry::new(Arc::new(config))?;

    registry.register_menu_item(MenuItem::new("Home", "/").weight(-10.0))?;
    registry.register_menu_item(MenuItem::new("Docs", "/docs").weight(0.0))?;
    registry.register_menu_item(MenuItem::new("About", "/about").weight(5.0))?;
    registry.register_menu_item(
        MenuItem::new("Admin", "/admin")
            .weight(10.0)
            .filter(|req, _| req.session_value("role") == Some(&json!("admin"))),
    )?;

    registry.register(
        BlockDefinition::new()
            .region("header")
            .computed(|_, _| Ok(json!("<h1>Lane Blocks Demo</h1>"))),
    )?;

    registry.register(
        BlockDefinition::new()
            .route("/docs/*")
            .region("left")
            .template("sidebar")
            .field("title", "Documentation")
            .computed(|req, _| {
                Ok(json!({ "body": format!("You are reading {}", req.path()) }))
            }),
    )?;

    registry.register(
        BlockDefinition::new()
            .route("/user/:id")
            .region("right")
            .loader(|req, _| {
                let id = req.path().rsplit('/').next().unwrap_or_default().to_string();
                req.data.insert("profile".to_string(), Value::String(id));
                Ok(())
            })
            .computed(|req, _| match req.data_value("profile") {
                Some(Value::String(id)) => Ok(json!(format!("Profile of user {}", id))),
                _ => Err(ContentError::new("profile not loaded")),
            }),
    )?;

    registry.register(
        BlockDefinition::new()
            .region("footer")
            .weight(100.0)
            .content("Powered by Express Lane"),
    )?;

    Ok(registry)
}

fn demo_renderer() -> PlaceholderRenderer {
    PlaceholderRenderer::new()
        .with_template("menu_item", "<a href=\"{{href}}\">{{title}}</a>")
        .with_template("sidebar", "<aside><h3>{{title}}</h3><p>{{body}}</p></aside>")
        .with_template(
            "layout",
            "<html><head><title>{{site_title}}</title></head>\n\
             <body class=\"{{body_classes}}\">\n\
             <header>{{ blocks:header }}</header>\n\
             <nav>{{ blocks:menu }}</nav>\n\
             <div class=\"left\">{{ blocks:left }}</div>\n\
             <main>{{ body }}</main>\n\
             <div class=\"right\">{{ blocks:right }}</div>\n\
             <footer>{{ blocks:footer }}</footer>\n\
             </body></html>",
        )
        .with_template("page", "{{ blocks:content }}<p>{{current_url}}</p>")
        .with_layout("layout")
}

fn print_region(region: &str, items: &[ResolvedBlock]) {
    println!("[{}]", region);
    if items.is_empty() {
        println!("  (empty)");
    }
    for item in items {
        let shown = match item.markup() {
            Some(markup) => markup.to_string(),
            None => item.value.to_string(),
        };
        println!("  {:>6} {}", item.weight, shown);
    }
}
