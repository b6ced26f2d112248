use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Subject {
    id: String,
    name: String,
    emoji: String,
}

#[derive(Debug, Deserialize)]
struct Checkpoint {
    id: i64,
    title: String,
    description: String,
    date: String,
    priority: String,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct Stats {
    total: usize,
    completed: usize,
    progress_percent: u32,
    overdue_count: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "checkpoint_tracker_http_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/subjects")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_checkpoint_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create_subject(client: &Client, base_url: &str, name: &str, emoji: &str) -> Subject {
    let response = client
        .post(format!("{base_url}/api/subjects"))
        .json(&serde_json::json!({ "name": name, "emoji": emoji }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn stats(client: &Client, base_url: &str, subject_id: &str) -> Stats {
    client
        .get(format!("{base_url}/api/subjects/{subject_id}/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_lists_default_subjects_in_order() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let subjects: Vec<Subject> = client
        .get(format!("{}/api/subjects", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<_> = subjects.iter().map(|subject| subject.id.as_str()).collect();
    assert!(ids.starts_with(&["dsa", "java", "webdev", "projects"]));
}

#[tokio::test]
async fn http_add_toggle_and_delete_checkpoint() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let subject = create_subject(&client, &server.base_url, "DevOps", "🚀").await;
    assert_eq!(subject.name, "DevOps");
    assert_eq!(subject.emoji, "🚀");
    let base = format!("{}/api/subjects/{}/checkpoints", server.base_url, subject.id);

    let response = client
        .post(&base)
        .json(&serde_json::json!({
            "title": "Finish spec",
            "description": "- outline\n- review",
            "date": "2024-01-01",
            "priority": "high"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let added: Checkpoint = response.json().await.unwrap();
    assert_eq!(added.title, "Finish spec");
    assert_eq!(added.description, "- outline\n- review");
    assert_eq!(added.date, "2024-01-01");
    assert_eq!(added.priority, "high");
    assert!(!added.completed);

    let before = stats(&client, &server.base_url, &subject.id).await;
    assert_eq!(before.total, 1);
    assert_eq!(before.overdue_count, 1);

    let toggled: Checkpoint = client
        .patch(format!("{base}/{}", added.id))
        .json(&serde_json::json!({ "completed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(toggled.completed);

    let after = stats(&client, &server.base_url, &subject.id).await;
    assert_eq!(after.completed, before.completed + 1);
    assert_eq!(after.progress_percent, 100);
    assert_eq!(after.overdue_count, 0);

    let response = client
        .delete(format!("{base}/{}", added.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let remaining: Vec<Checkpoint> = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn http_edit_replaces_in_place_and_filters_apply() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let subject = create_subject(&client, &server.base_url, "Reading", "📖").await;
    let base = format!("{}/api/subjects/{}/checkpoints", server.base_url, subject.id);

    let mut ids = Vec::new();
    for (title, priority) in [("Dune", "low"), ("Hyperion", "high"), ("Solaris", "medium")] {
        let added: Checkpoint = client
            .post(&base)
            .json(&serde_json::json!({ "title": title, "date": "2099-01-01", "priority": priority }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        ids.push(added.id);
    }

    let response = client
        .put(format!("{base}/{}", ids[0]))
        .json(&serde_json::json!({
            "title": "Dune Messiah",
            "description": "sequel",
            "date": "2099-02-01",
            "priority": "high",
            "completed": false
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let all: Vec<Checkpoint> = client.get(&base).send().await.unwrap().json().await.unwrap();
    let titles: Vec<_> = all.iter().map(|checkpoint| checkpoint.title.as_str()).collect();
    assert_eq!(titles, ["Dune Messiah", "Hyperion", "Solaris"]);
    assert_eq!(all[0].id, ids[0]);

    let high: Vec<Checkpoint> = client
        .get(format!("{base}?priority=high"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(high.len(), 2);

    let found: Vec<Checkpoint> = client
        .get(format!("{base}?q=SEQUEL"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ids[0]);
}

#[tokio::test]
async fn http_rejects_invalid_input_without_writing() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/subjects", server.base_url))
        .json(&serde_json::json!({ "name": "  ", "emoji": "🚀" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Please enter a subject name");

    let base = format!("{}/api/subjects/projects/checkpoints", server.base_url);
    let before: Vec<Checkpoint> = client.get(&base).send().await.unwrap().json().await.unwrap();
    let response = client
        .post(&base)
        .json(&serde_json::json!({ "title": "No date" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let after: Vec<Checkpoint> = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(after.len(), before.len());

    let response = client
        .get(format!("{}/api/subjects/missing/checkpoints", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_deleting_subject_drops_its_checkpoints() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let subject = create_subject(&client, &server.base_url, "Temp", "🧪").await;

    client
        .post(format!("{}/api/subjects/{}/checkpoints", server.base_url, subject.id))
        .json(&serde_json::json!({ "title": "Scratch", "date": "2099-01-01" }))
        .send()
        .await
        .unwrap();

    for _ in 0..2 {
        let response = client
            .delete(format!("{}/api/subjects/{}", server.base_url, subject.id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let subjects: Vec<Subject> = client
        .get(format!("{}/api/subjects", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(subjects.iter().all(|existing| existing.id != subject.id));

    let export: serde_json::Value = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sections = export["subjects"].as_array().expect("sections");
    assert!(sections
        .iter()
        .all(|section| section["subject"]["id"] != subject.id.as_str()));
}

#[tokio::test]
async fn http_index_renders_the_active_tab() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let html = client
        .get(format!("{}/?tab=java", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"<a class="nav-tab active" href="/?tab=java">☕ Java</a>"#));
    assert!(html.contains(r#"action="/subjects/java/checkpoints""#));
}
