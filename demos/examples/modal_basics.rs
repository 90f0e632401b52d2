// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Modal basics.
//!
//! Opens a modal with a form, clicks its accept link, and prints the value the
//! opener receives. A second modal is then dismissed with its dismiss button.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p overstory_demos --example modal_basics`

use futures::executor::LocalPool;
use overstory_dom::Element;
use overstory_layer::{Context, HookSlot, OverlayOptions, open};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pool = LocalPool::new();
    let ctx = Context::builder(pool.spawner()).build();

    // Content lives outside the document until the overlay adopts it.
    let form = ctx.document_mut().insert(None, Element::new("form"));
    let save = ctx.document_mut().insert(
        Some(form),
        Element::new("a")
            .with_attr("ov-accept", r#"{"name": "Ada"}"#)
            .with_attr("ov-animation", "false")
            .with_text("Save"),
    );

    let options = OverlayOptions::default().on(HookSlot::Accepted, |overlay, event| {
        println!("{overlay} accepted with {}", event.detail);
    });
    let modal = pool
        .run_until(open(&ctx, options, Some(form)))
        .expect("modal opens");
    println!("opened {modal} at nesting depth {}", modal.nesting());

    let result = modal.result();
    ctx.events().click(save);
    pool.run_until_stalled();
    println!("opener received {:?}", pool.run_until(result));

    let second = pool
        .run_until(open(&ctx, OverlayOptions::default(), None))
        .expect("second modal opens");
    let dismiss = second.parts().dismiss.expect("dismiss button");
    let result = second.result();
    ctx.events().click(dismiss);
    pool.run_until_stalled();
    println!("opener received {:?}", pool.run_until(result));
    println!("stack is empty: {}", ctx.stack().is_empty());
}
