// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Popup dismissal.
//!
//! Opens a popup from a button. Clicking the button again is swallowed, Escape
//! first leaves a focused field, and a click elsewhere finally dismisses it.
//!
//! Run:
//! - `RUST_LOG=overstory_layer=trace cargo run -p overstory_demos --example popup_outside`

use futures::executor::LocalPool;
use overstory_dom::{Element, ElementFlags};
use overstory_layer::{Context, OverlayOptions, open};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pool = LocalPool::new();
    let ctx = Context::builder(pool.spawner()).build();
    let body = ctx.body();
    let button = ctx.document_mut().affix(body, "button", [("id", "menu")]);
    let elsewhere = ctx.document_mut().affix(body, "p", [("id", "intro")]);

    let search = ctx
        .document_mut()
        .insert(None, Element::new("input").with_flags(ElementFlags::FIELD));
    let popup = pool
        .run_until(open(
            &ctx,
            OverlayOptions::default()
                .with_mode("popup")
                .with_origin(button),
            Some(search),
        ))
        .expect("popup opens");
    let result = popup.result();

    let click = ctx.events().click(button);
    pool.run_until_stalled();
    println!("origin click swallowed: {}, still open: {}", click.default_prevented(), popup.is_open());

    ctx.events().focus(search);
    ctx.events().press_key("Escape");
    pool.run_until_stalled();
    println!("escape with a focused field, still open: {}", popup.is_open());

    ctx.events().click(elsewhere);
    pool.run_until_stalled();
    println!("outside click closed it: {}", popup.is_closed());
    println!("opener received {:?}", pool.run_until(result));
}
