// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

/// 摄取服务模拟器中的单个任务
#[derive(Debug, Clone)]
pub struct MockTask {
    pub file_name: String,
    pub page_count: u32,
    pub model: String,
    pub ocr_strategy: String,
    pub segmentation_strategy: String,
    pub has_schema: bool,
    pub polls: u32,
}

/// 摄取服务模拟器状态
///
/// 文件名前缀驱动任务走向：`reject`开头的提交被拒绝，
/// `droppoll`开头的任务状态查询返回500，`failtask`开头的
/// 任务以失败终态结束。其余任务第一次查询返回处理中，
/// 之后成功，页数等于上传内容的字节数。
#[derive(Clone, Default)]
pub struct MockApiState {
    tasks: Arc<Mutex<HashMap<String, MockTask>>>,
}

impl MockApiState {
    pub fn tasks(&self) -> Vec<MockTask> {
        self.tasks.lock().values().cloned().collect()
    }
}

/// 启动进程内的摄取服务模拟器
///
/// 返回基础URL和可供断言的状态句柄
pub async fn start_mock_api() -> (String, MockApiState) {
    let state = MockApiState::default();
    let app = Router::new()
        .route("/", post(submit_task))
        .route("/{task_id}", get(task_status))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

async fn submit_task(State(state): State<MockApiState>, mut multipart: Multipart) -> Response {
    let mut file_name = String::new();
    let mut page_count = 0u32;
    let mut model = String::new();
    let mut ocr_strategy = String::new();
    let mut segmentation_strategy = String::new();
    let mut has_schema = false;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                page_count = field.bytes().await.unwrap().len() as u32;
            }
            "model" => model = field.text().await.unwrap(),
            "ocr_strategy" => ocr_strategy = field.text().await.unwrap(),
            "segmentation_strategy" => segmentation_strategy = field.text().await.unwrap(),
            "json_schema" => {
                has_schema = true;
                let _ = field.text().await;
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    if file_name.starts_with("reject") {
        return (StatusCode::UNPROCESSABLE_ENTITY, "rejected by mock").into_response();
    }

    let task_id = Uuid::new_v4().simple().to_string();
    state.tasks.lock().insert(
        task_id.clone(),
        MockTask {
            file_name: file_name.clone(),
            page_count,
            model,
            ocr_strategy,
            segmentation_strategy,
            has_schema,
            polls: 0,
        },
    );

    Json(json!({
        "task_id": task_id,
        "status": "Starting",
        "file_name": file_name,
        "message": "Task is starting",
        "page_count": 0
    }))
    .into_response()
}

async fn task_status(
    State(state): State<MockApiState>,
    Path(task_id): Path<String>,
) -> Response {
    let task = {
        let mut tasks = state.tasks.lock();
        let Some(task) = tasks.get_mut(&task_id) else {
            return (StatusCode::NOT_FOUND, "no such task").into_response();
        };
        task.polls += 1;
        task.clone()
    };

    if task.file_name.starts_with("droppoll") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mock poll outage").into_response();
    }

    if task.polls == 1 {
        return Json(json!({
            "task_id": task_id,
            "status": "Processing",
            "file_name": task.file_name,
            "message": "Processing page 1",
            "page_count": task.page_count
        }))
        .into_response();
    }

    if task.file_name.starts_with("failtask") {
        return Json(json!({
            "task_id": task_id,
            "status": "Failed",
            "file_name": task.file_name,
            "message": "Task failed",
            "page_count": task.page_count
        }))
        .into_response();
    }

    let output = task.has_schema.then(|| {
        json!([{
            "title": "Mock Document",
            "author": "Mock Author",
            "date_published": null,
            "location": null
        }])
    });

    Json(json!({
        "task_id": task_id,
        "status": "Succeeded",
        "file_name": task.file_name,
        "message": "Task succeeded",
        "page_count": task.page_count,
        "output": output
    }))
    .into_response()
}
