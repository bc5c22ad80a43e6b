//! 测试辅助：本地 actix-web 假上游，避免测试访问外网

use actix_web::{http::StatusCode, rt::System, web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use std::net::TcpListener;
use std::sync::{Arc, Once};
use std::time::Duration;

use crate::config::ProviderConfig;

/// 测试中一定存在的 API Key 环境变量
pub const TEST_KEY_ENV: &str = "MARKET_DESK_TEST_API_KEY";
/// 测试中一定不存在的 API Key 环境变量
pub const UNSET_KEY_ENV: &str = "MARKET_DESK_TEST_UNSET_API_KEY";

static SET_KEY: Once = Once::new();

pub fn provider_config(base_url: &str, key_env: &str, timeout_ms: u64) -> ProviderConfig {
    SET_KEY.call_once(|| std::env::set_var(TEST_KEY_ENV, "test-key"));
    ProviderConfig {
        base_url: base_url.to_string(),
        api_key_env: key_env.to_string(),
        timeout_ms,
    }
}

/// 固定响应的假上游
pub struct FakeUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    /// 最近一次请求的请求行和请求头
    pub fn last_request(&self) -> String {
        self.requests.lock().last().cloned().unwrap_or_default()
    }

    /// 最近一次请求的请求行
    pub fn last_request_line(&self) -> String {
        self.last_request().lines().next().unwrap_or_default().to_string()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

/// 还原成报文形式：请求行加请求头
fn describe(req: &HttpRequest) -> String {
    let mut head = format!("{} {} {:?}\r\n", req.method(), req.uri(), req.version());
    for (name, value) in req.headers() {
        head.push_str(&format!("{}: {}\r\n", name, value.to_str().unwrap_or_default()));
    }
    head
}

/// 假上游的固定回复
#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: String,
    /// 回复前的等待时间
    delay: Duration,
}

/// 在独立线程的 actix System 中启动假上游，和调用方使用哪种运行时无关
fn serve(reply: Reply, recorded: Arc<Mutex<Vec<String>>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    std::thread::spawn(move || {
        System::new().block_on(async move {
            let server = HttpServer::new(move || {
                let reply = reply.clone();
                let recorded = recorded.clone();
                App::new().default_service(web::to(move |req: HttpRequest| {
                    let reply = reply.clone();
                    let recorded = recorded.clone();
                    async move {
                        recorded.lock().push(describe(&req));
                        if !reply.delay.is_zero() {
                            actix_web::rt::time::sleep(reply.delay).await;
                        }
                        HttpResponse::build(reply.status)
                            .content_type("application/json")
                            .body(reply.body)
                    }
                }))
            })
            .workers(1)
            .disable_signals()
            .listen(listener)
            .unwrap()
            .run();
            let _ = server.await;
        })
    });

    base_url
}

/// 启动一个对所有请求返回固定状态码和响应体的假上游
pub async fn spawn_responder(status: u16, body: &str) -> FakeUpstream {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let reply = Reply {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
        delay: Duration::ZERO,
    };
    let base_url = serve(reply, requests.clone());

    FakeUpstream { base_url, requests }
}

/// 启动一个接受请求但迟迟不响应的假上游，用于超时测试
pub async fn spawn_silent() -> String {
    let reply = Reply {
        status: StatusCode::OK,
        body: String::new(),
        delay: Duration::from_secs(60),
    };
    serve(reply, Arc::new(Mutex::new(Vec::new())))
}
