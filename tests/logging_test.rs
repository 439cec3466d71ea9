/// The diagnostic channel: dropped frames and failures are logged, never answered.
use cms_mcp::mcp::registry::Registry;
use cms_mcp::mcp::tools::SystemInfoTool;
use cms_mcp::McpServer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

mod helpers;
use helpers::log_validator::LogValidator;
use helpers::sites::SiteFixture;

fn capture() -> (LogValidator, tracing::subscriber::DefaultGuard) {
    let validator = LogValidator::new();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with(validator.layer());
    let guard = tracing::subscriber::set_default(subscriber);
    (validator, guard)
}

#[tokio::test]
async fn test_dropped_frames_are_warned() {
    let (logs, _guard) = capture();
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    assert!(server.process_line("{broken").await.is_none());
    assert!(server
        .process_line(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#)
        .await
        .is_none());

    assert!(logs.contains(Level::WARN, "Dropping undecodable frame: malformed JSON"));
    assert!(logs.contains(Level::WARN, "unsupported jsonrpc version: 1.0"));
}

#[tokio::test]
async fn test_request_lifecycle_logging() {
    let (logs, _guard) = capture();
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    server
        .process_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"page_list","arguments":{"site":"shop.test"}}}"#)
        .await
        .unwrap();
    server
        .process_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"page_list","arguments":{"site":"ghost.test"}}}"#)
        .await
        .unwrap();

    let result = logs.validate(&[
        ("Initializing MCP server", "Server construction"),
        ("Dispatching tools/call", "Dispatch"),
        ("Switched site", "Site switch"),
        ("Site not found: ghost.test", "Failed switch"),
    ]);
    logs.print_summary(&result);
    assert!(result.is_valid(), "{:?}", result);

    let stats = logs.get_stats();
    assert!(stats.warn >= 1);
    assert_eq!(stats.error, 0);
}

#[tokio::test]
async fn test_duplicate_registration_is_warned() {
    let (logs, _guard) = capture();

    let mut registry = Registry::new();
    registry.register_tool(SystemInfoTool);
    registry.register_tool(SystemInfoTool);

    assert_eq!(registry.tools().count(), 1);
    assert!(logs.contains(Level::WARN, "Duplicate tool registration: system_info"));
}
