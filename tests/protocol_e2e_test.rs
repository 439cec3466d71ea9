/// End-to-end protocol tests: newline-delimited JSON-RPC in, responses out,
/// driven through the real stdio loop over in-memory IO.
use async_trait::async_trait;
use cms_mcp::mcp::registry::Registry;
use cms_mcp::mcp::tools::{Tool, ToolContext, ToolResult};
use cms_mcp::mcp::transport::StdioTransport;
use cms_mcp::McpServer;
use serde_json::{json, Map, Value};
use tokio::io::BufReader;
use tokio_test::io::Builder;

mod helpers;
use helpers::sites::SiteFixture;

/// Feeds `input` to a fresh server and returns every line it wrote.
async fn run_lines(server: &McpServer, input: &str) -> Vec<Value> {
    let reader = BufReader::new(input.as_bytes());
    let mut transport = StdioTransport::with_io(reader, Vec::new());
    server.run_transport(&mut transport).await.unwrap();

    let (_, written) = transport.into_inner();
    let output = String::from_utf8(written).unwrap();
    assert!(output.is_empty() || output.ends_with('\n'));
    output
        .lines()
        .map(|line| serde_json::from_str(line).expect("every output line is JSON"))
        .collect()
}

fn line(value: Value) -> String {
    format!("{}\n", value)
}

#[tokio::test]
async fn test_ping_exact_bytes() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let reader = Builder::new()
        .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
        .build();
    let writer = Builder::new()
        .write(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":\"pong\"}\n")
        .build();
    let mut transport = StdioTransport::with_io(BufReader::new(reader), writer);

    server.run_transport(&mut transport).await.unwrap();
}

#[tokio::test]
async fn test_system_info_response() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let out = run_lines(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"system_info","arguments":{}}}
"#,
    )
    .await;

    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0],
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "content": [{ "type": "text", "text": "cms_mcp v0.1.0 (rust 1.75)" }] }
        })
    );
}

#[tokio::test]
async fn test_notifications_and_bad_frames_produce_no_output() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let input = [
        line(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        line(json!({"jsonrpc": "2.0", "method": "tools/call", "params": {"name": "nope"}})),
        line(json!({"jsonrpc": "2.0", "id": null, "method": "ping"})),
        "{this is not json\n".to_string(),
        "\n".to_string(),
        line(json!({"jsonrpc": "1.0", "id": 2, "method": "ping"})),
        line(json!({"id": 3, "method": "ping"})),
        line(json!({"jsonrpc": "2.0", "id": [4], "method": "ping"})),
        line(json!({"jsonrpc": "2.0", "method": "ping", "params": [1]})),
        line(json!({"jsonrpc": "2.0", "id": 6, "method": "ping"})),
    ]
    .concat();

    let out = run_lines(&server, &input).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["id"], 6);
    assert_eq!(out[0]["result"], "pong");
}

#[tokio::test]
async fn test_invalid_request_with_readable_id_is_answered() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let input = [
        line(json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call", "params": ["system_info"]})),
        line(json!({"jsonrpc": "2.0", "id": "no-method"})),
        line(json!({"jsonrpc": "2.0", "id": 10, "method": "ping"})),
    ]
    .concat();

    let out = run_lines(&server, &input).await;
    assert_eq!(out.len(), 3);
    assert_eq!(out[0]["id"], 9);
    assert_eq!(out[0]["error"]["code"], -32602);
    assert_eq!(out[1]["id"], "no-method");
    assert_eq!(out[1]["error"]["code"], -32600);
    assert_eq!(out[2]["result"], "pong");
}

#[tokio::test]
async fn test_non_integer_ids_are_echoed_verbatim() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1.5,\"method\":\"ping\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":1.0,\"method\":\"ping\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":18446744073709551615,\"method\":\"ping\"}\n",
    );
    let mut transport = StdioTransport::with_io(BufReader::new(input.as_bytes()), Vec::new());
    server.run_transport(&mut transport).await.unwrap();

    let (_, written) = transport.into_inner();
    assert_eq!(
        String::from_utf8(written).unwrap(),
        concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1.5,\"result\":\"pong\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":1.0,\"result\":\"pong\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":18446744073709551615,\"result\":\"pong\"}\n",
        )
    );
}

#[tokio::test]
async fn test_non_utf8_line_is_dropped_and_loop_continues() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"x\":\"".to_vec();
    input.push(0xff);
    input.extend_from_slice(b"\"}\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

    let mut transport = StdioTransport::with_io(BufReader::new(input.as_slice()), Vec::new());
    server.run_transport(&mut transport).await.unwrap();

    let (_, written) = transport.into_inner();
    assert_eq!(
        String::from_utf8(written).unwrap(),
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":\"pong\"}\n"
    );
}

#[tokio::test]
async fn test_unknown_tool_echoes_id() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let out = run_lines(
        &server,
        &line(json!({
            "jsonrpc": "2.0", "id": "call-7", "method": "tools/call",
            "params": {"name": "does_not_exist", "arguments": {}}
        })),
    )
    .await;

    assert_eq!(out[0]["id"], "call-7");
    assert_eq!(out[0]["error"]["code"], -32601);
    assert!(out[0].get("result").is_none());
}

#[tokio::test]
async fn test_responses_keep_request_order() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let input: String = (1..=5)
        .map(|n| line(json!({"jsonrpc": "2.0", "id": n, "method": "ping"})))
        .collect();
    let out = run_lines(&server, &input).await;

    let ids: Vec<i64> = out.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_client_session_walkthrough() {
    let sites = SiteFixture::standard();
    let server = McpServer::new(sites.config());

    let input = [
        line(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05"}})),
        line(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        line(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})),
        line(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
            "name": "page_create",
            "arguments": {"title": "Spring Sale!", "content": "Everything must go", "site": "shop.test"}
        }})),
        line(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
            "name": "page_get", "arguments": {"slug": "spring-sale", "site": "shop.test"}
        }})),
        line(json!({"jsonrpc": "2.0", "id": 5, "method": "resources/read", "params": {"uri": "cms://sites/list"}})),
        line(json!({"jsonrpc": "2.0", "id": 6, "method": "prompts/list"})),
    ]
    .concat();

    let out = run_lines(&server, &input).await;
    assert_eq!(out.len(), 6);

    assert_eq!(out[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(out[0]["result"]["serverInfo"]["name"], "cms_mcp");

    let tools = out[1]["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t["name"] == "page_create"));

    let created: Value =
        serde_json::from_str(out[2]["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(created["slug"], "spring-sale");
    assert_eq!(created["status"], "draft");

    let fetched: Value =
        serde_json::from_str(out[3]["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(fetched["id"], created["id"]);

    let contents = &out[4]["result"]["contents"][0];
    assert_eq!(contents["mimeType"], "application/json");
    let listed: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert!(listed.is_array());

    assert_eq!(out[5]["result"]["prompts"].as_array().unwrap().len(), 3);
}

struct GreetTool;

#[async_trait]
impl Tool for GreetTool {
    fn name(&self) -> &str {
        "greet"
    }

    fn description(&self) -> &str {
        "Say hello"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"who": {"type": "string"}}})
    }

    fn requires_site(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _ctx: &ToolContext<'_>,
        args: &Map<String, Value>,
    ) -> cms_mcp::Result<ToolResult> {
        let who = cms_mcp::mcp::tools::optional_str(args, "who")?.unwrap_or("world");
        Ok(ToolResult::text(format!("hello, {}", who)))
    }
}

#[tokio::test]
async fn test_registered_tool_is_listed_and_callable() {
    let sites = SiteFixture::empty();
    let mut registry = Registry::new();
    registry.register_tool(GreetTool);
    let server = McpServer::with_registry(sites.config(), registry);

    let input = [
        line(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
        line(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "greet", "arguments": {"who": "ada"}}})),
    ]
    .concat();
    let out = run_lines(&server, &input).await;

    assert_eq!(out[0]["result"]["tools"][0]["name"], "greet");
    let text = out[1]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(!text.is_empty());
    assert_eq!(text, "hello, ada");
}
