//! Renders a small reactive page to stdout, mutating its data sources
//! between prints. Run with `RUST_LOG=trace` to watch the store at work.
use serde::Serialize;
use serde_json::json;
use stax::prelude::*;

#[derive(Serialize)]
struct Profile {
    name: String,
    visits: u64,
}

fn main() -> Result<(), StoreError> {
    env_logger::init();

    let mut store = Store::new();
    let profile = Profile {
        name: "Ada".to_string(),
        visits: 1,
    };
    store.create(
        "profile",
        serde_json::to_value(&profile).expect("profile serializes"),
    )?;
    store.create("motd", json!("Welcome back"))?;

    let session = Observed::new();
    session.set("device", json!("tty"));

    let banner = ElementBuilder::new("h1")
        .id("banner")
        .bind_store("motd")
        .build_with(&mut store)?;
    let status = ElementBuilder::new("p")
        .class("status")
        .text("Connected from &(session.device)")
        .bindings(Bindings::new().with("session", session.clone()))
        .build();

    let profile_bindings = json!({ "profile": store.get("profile").cloned().unwrap_or_default() });
    let greeting_ids = bind_to_store(
        "Hello &(profile.name), visit #&(profile.visits)",
        profile_bindings.as_object().cloned().unwrap_or_default(),
        &mut store,
        |text| println!("greeting -> {}", text),
    )?;
    log::info!("registered {} greeting subscriptions", greeting_ids.len());

    let page = ElementBuilder::new("div")
        .class("page")
        .children([banner, status])
        .build();
    println!("{}", page.render());

    store.flush_update("motd", json!("Good to see you"))?;
    store.update("profile", json!({"name": "Grace", "visits": 2}))?;
    session.set("device", json!("pty"));
    println!("{}", page.render());

    Ok(())
}
