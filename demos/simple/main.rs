use nodeflow::{ChannelEvent, ChannelOptions, EngineBuilder, ExecutionContext, ExecutionOptions, WorkflowModel};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> nodeflow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let engine = EngineBuilder::new().build()?;

    let text = include_str!("./workflow.json");
    let workflow_model = WorkflowModel::from_json(text)?;

    let report = engine.deploy(&workflow_model)?;
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }

    let observers = ChannelEvent::channel(engine.channel(), ChannelOptions::default())?;
    observers.on_complete(move |eid| {
        println!("Workflow completed, eid: {}", eid);
    });
    observers.on_error(move |e| {
        println!("Workflow failed: {:?}", e.event.name());
    });
    observers.on_log(move |log| {
        println!("[{}] {} {}: {}", log.eid, log.entry.level, log.nid, log.entry.message);
    });

    let context = ExecutionContext::new().with_variable("order_id", json!("A-1042")).with_trigger(json!({ "customer": "jane@example.com" }));
    let handle = engine.spawn(&workflow_model.id, ExecutionOptions::new().with_context(context))?;
    let execution = handle.wait().await?;

    println!("Status: {}", execution.status);
    for node in &execution.node_executions {
        println!("{} ({}): {:#?}", node.node_id, node.status, node.output);
    }
    Ok(())
}
