// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Location-driven closing.
//!
//! A drawer accepts itself when its location reaches a saved item, and
//! dismisses itself when navigation leaves the items section.
//!
//! Run:
//! - `cargo run -p overstory_demos --example location_close`

use futures::executor::LocalPool;
use overstory_layer::{Context, OverlayOptions, open};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pool = LocalPool::new();
    let ctx = Context::builder(pool.spawner()).build();

    let options = OverlayOptions::from_json(
        r#"{
            "mode": "drawer",
            "acceptLocation": "/items/$id -/items/new",
            "dismissLocation": "/home /about"
        }"#,
    )
    .expect("valid options");
    let drawer = pool.run_until(open(&ctx, options, None)).expect("drawer opens");
    let result = drawer.result();

    for location in ["/items/new", "/items/new/details", "https://example.com/items/17?tab=info"] {
        let closing = drawer.navigate(location);
        pool.run_until_stalled();
        println!("{location}: closing = {closing}");
    }
    println!("opener received {:?}", pool.run_until(result));
}
