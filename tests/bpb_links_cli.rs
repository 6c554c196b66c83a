use base64::Engine as _;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const SCENARIO_VLESS: &str = r#"{"remarks":"A","outbounds":[{"protocol":"vless","tag":"srv1","settings":{"vnext":[{"address":"1.2.3.4","port":443,"users":[{"id":"uuid-1","flow":"xtls-rprx-vision"}]}]},"streamSettings":{"network":"ws","security":"tls","tlsSettings":{"serverName":"example.com"},"wsSettings":{"path":"/ws","host":"example.com"}}}]}"#;

const SCENARIO_VLESS_LINK: &str = "vless://uuid-1@1.2.3.4:443?encryption=none&flow=xtls-rprx-vision&security=tls&sni=example.com&type=ws&host=example.com&path=%2Fws#srv1";

fn write_input(dir: &Path, content: &str) -> String {
    let path = dir.join("config.json");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn raw_output_for_vless_ws_tls() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(tmp.path(), SCENARIO_VLESS);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile, "--format", "raw"]);
    cmd.assert()
        .success()
        .stdout(format!("{SCENARIO_VLESS_LINK}\n"));
}

#[test]
fn default_output_is_base64_of_raw_text() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(tmp.path(), SCENARIO_VLESS);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(!stdout.contains('\n'));
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(stdout.as_bytes())
        .unwrap();
    assert_eq!(
        String::from_utf8(decoded).unwrap(),
        format!("{SCENARIO_VLESS_LINK}\n")
    );
}

#[test]
fn freedom_outbound_is_dropped_next_to_trojan() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(
        tmp.path(),
        r#"{"remarks":"B","outbounds":[
            {"protocol":"freedom","tag":"direct","settings":{}},
            {"protocol":"trojan","tag":"tr","settings":{"servers":[{"address":"example.com","port":443,"password":"secret"}]},
             "streamSettings":{"network":"ws","security":"tls","tlsSettings":{"serverName":"example.com","alpn":["http/1.1"]}}}
        ]}"#,
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile, "--format", "raw"]);
    cmd.assert().success().stdout(
        "trojan://secret@example.com:443?security=tls&sni=example.com&alpn=http%2F1.1&type=ws#tr\n",
    );
}

#[test]
fn empty_outbounds_fail_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(
        tmp.path(),
        r#"[{"remarks":"A","outbounds":[]},{"remarks":"B","outbounds":[]}]"#,
    );
    let out = tmp.path().join("sub.txt");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args([
        "--infile",
        &infile,
        "--out",
        &out.to_string_lossy(),
    ]);
    cmd.assert()
        .failure()
        .code(5)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No vless/trojan links extracted"));
    assert!(!out.exists());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile, "--format", "raw"]);
    cmd.assert()
        .failure()
        .code(5)
        .stdout(predicate::str::is_empty());
}

#[test]
fn ipv6_address_is_bracketed() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(
        tmp.path(),
        r#"{"outbounds":[{"protocol":"trojan","settings":{"servers":[{"address":"2001:db8::1","port":8443,"password":"pw"}]}}]}"#,
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile, "--format", "raw"]);
    cmd.assert()
        .success()
        .stdout("trojan://pw@[2001:db8::1]:8443?#bpb\n");
}

#[test]
fn duplicate_links_across_items_are_written_once() {
    let tmp = tempfile::tempdir().unwrap();
    let item = r#"{"remarks":"same","outbounds":[{"protocol":"vless","settings":{"vnext":[{"address":"example.com","port":443,"users":[{"id":"u-1"}]}]}}]}"#;
    let other = r#"{"remarks":"other","outbounds":[{"protocol":"vless","settings":{"vnext":[{"address":"example.com","port":443,"users":[{"id":"u-2"}]}]}}]}"#;
    let infile = write_input(tmp.path(), &format!("[{item},{other},{item}]"));

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile, "--format", "raw"]);
    cmd.assert().success().stdout(
        "vless://u-1@example.com:443?encryption=none#same\nvless://u-2@example.com:443?encryption=none#other\n",
    );
}

#[test]
fn out_flag_writes_file_and_keeps_stdout_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(tmp.path(), SCENARIO_VLESS);
    let out = tmp.path().join("nested/sub.txt");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args([
        "--infile",
        &infile,
        "--format",
        "raw",
        "--out",
        &out.to_string_lossy(),
    ]);
    cmd.assert().success().stdout(predicate::str::is_empty());

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        format!("{SCENARIO_VLESS_LINK}\n")
    );
}

#[test]
fn invalid_json_exits_4() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = write_input(tmp.path(), "{\"outbounds\": [");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile]);
    cmd.assert()
        .failure()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid_json"));
}

#[test]
fn missing_infile_exits_3() {
    let tmp = tempfile::tempdir().unwrap();
    let infile = tmp.path().join("nope.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--infile", &infile.to_string_lossy()]);
    cmd.assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("input_error"));
}

#[test]
fn missing_input_flag_is_usage_error() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.assert().failure().code(2);
}

#[tokio::test]
async fn url_input_is_fetched_with_user_agent() {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub/abc"))
        .and(header("user-agent", "bpb4-to-v2ray/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCENARIO_VLESS))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/sub/abc", server.uri());
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--url", &url, "--format", "raw", "--timeout", "5"]);
    cmd.assert()
        .success()
        .stdout(format!("{SCENARIO_VLESS_LINK}\n"));
}

#[tokio::test]
async fn url_http_error_exits_3() {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/sub/abc", server.uri());
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bpb-links");
    cmd.args(["--url", &url, "--timeout", "5"]);
    cmd.assert()
        .failure()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("input_error"));
}
