//! Minimal end-to-end walkthrough: define a component, connect a host,
//! drive updates through the scheduler and watch the lifecycle go by.
//!
//! Run with `RUST_LOG=trace cargo run --example counter` to see the
//! scheduler's trace output alongside the demo's own printout.

use flint_runtime::{
    Component, ComponentRuntimeMeta, HookResult, PropDef, PropType, PropValue, Runtime,
    RuntimeError, VNode, h,
};

struct Counter {
    count: f64,
}

impl Component for Counter {
    fn prop_changed(&mut self, name: &str, value: &PropValue) {
        if name == "count" {
            self.count = value.as_number().unwrap_or(0.0);
        }
    }

    fn component_will_load(&mut self) -> HookResult {
        println!("counter loading");
        HookResult::ok()
    }

    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Ok(Some(
            h("span").child(VNode::text(format!("count: {}", self.count))),
        ))
    }
}

fn main() -> Result<(), RuntimeError> {
    env_logger::init();

    let rt = Runtime::new();
    rt.define(
        ComponentRuntimeMeta::new("demo-counter")
            .prop(PropDef::new("count", PropType::Number).reflect().default_value(0)),
        || Counter { count: 0.0 },
    )?;

    // Observe lifecycle events bubbling to the root.
    rt.add_event_listener(rt.root(), "flint_componentDidRender", |event| {
        println!("rendered: {:?}", event.target);
    });

    let host = rt.create_element("demo-counter")?;
    rt.append_child(rt.root(), host.node_id());
    rt.flush();
    println!("{}", rt.document().outer_html(host.node_id()));

    for value in 1..=3 {
        rt.set_property(host, "count", value);
        rt.flush();
        println!("{}", rt.document().outer_html(host.node_id()));
    }

    Ok(())
}
