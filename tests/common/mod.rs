//! Shared fixtures for the HTTP route tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use web_widget::transport;
use web_widget::{DataAccessError, DataAccessResult, Widget, WidgetStore};

/// In-memory stand-in for the stored procedures, with server-assigned ids.
#[derive(Default)]
pub struct InMemoryWidgetStore {
    state: Mutex<(i32, BTreeMap<i32, Widget>)>,
}

#[async_trait]
impl WidgetStore for InMemoryWidgetStore {
    async fn list_widgets(&self) -> DataAccessResult<Vec<Widget>> {
        let state = self.state.lock().unwrap();
        Ok(state.1.values().cloned().collect())
    }

    async fn get_widget_by_id(&self, id: i32) -> DataAccessResult<Option<Widget>> {
        let state = self.state.lock().unwrap();
        Ok(state.1.get(&id).cloned())
    }

    async fn insert_widget(&self, widget: Option<&Widget>) -> DataAccessResult<Option<Widget>> {
        let widget = widget.ok_or(DataAccessError::InvalidArgument("Widget can not be null."))?;
        let mut state = self.state.lock().unwrap();
        state.0 += 1;
        let stored = widget.with_id(state.0);
        state.1.insert(stored.id, stored.clone());
        Ok(Some(stored))
    }

    async fn update_widget(&self, id: i32, widget: Option<&Widget>) -> DataAccessResult<u64> {
        let widget = widget.ok_or(DataAccessError::InvalidArgument("Widget can not be null."))?;
        let mut state = self.state.lock().unwrap();
        match state.1.get_mut(&id) {
            Some(row) => {
                *row = widget.with_id(id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_widget(&self, id: i32) -> DataAccessResult<u64> {
        let mut state = self.state.lock().unwrap();
        Ok(state.1.remove(&id).map_or(0, |_| 1))
    }

    async fn ping(&self) -> DataAccessResult<()> {
        Ok(())
    }
}

/// Behaves like `InMemoryWidgetStore`, except every insert reports zero affected rows.
#[derive(Default)]
pub struct NothingInsertedStore {
    inner: InMemoryWidgetStore,
}

#[async_trait]
impl WidgetStore for NothingInsertedStore {
    async fn list_widgets(&self) -> DataAccessResult<Vec<Widget>> {
        self.inner.list_widgets().await
    }

    async fn get_widget_by_id(&self, id: i32) -> DataAccessResult<Option<Widget>> {
        self.inner.get_widget_by_id(id).await
    }

    async fn insert_widget(&self, widget: Option<&Widget>) -> DataAccessResult<Option<Widget>> {
        widget.ok_or(DataAccessError::InvalidArgument("Widget can not be null."))?;
        Ok(None)
    }

    async fn update_widget(&self, id: i32, widget: Option<&Widget>) -> DataAccessResult<u64> {
        self.inner.update_widget(id, widget).await
    }

    async fn delete_widget(&self, id: i32) -> DataAccessResult<u64> {
        self.inner.delete_widget(id).await
    }

    async fn ping(&self) -> DataAccessResult<()> {
        self.inner.ping().await
    }
}

/// A store whose database is never reachable.
pub struct UnreachableStore;

fn unreachable() -> DataAccessError {
    DataAccessError::Timeout {
        operation: "connect".to_string(),
        timeout: Duration::from_secs(30),
    }
}

#[async_trait]
impl WidgetStore for UnreachableStore {
    async fn list_widgets(&self) -> DataAccessResult<Vec<Widget>> {
        Err(unreachable())
    }

    async fn get_widget_by_id(&self, _id: i32) -> DataAccessResult<Option<Widget>> {
        Err(unreachable())
    }

    async fn insert_widget(&self, widget: Option<&Widget>) -> DataAccessResult<Option<Widget>> {
        widget.ok_or(DataAccessError::InvalidArgument("Widget can not be null."))?;
        Err(unreachable())
    }

    async fn update_widget(&self, _id: i32, widget: Option<&Widget>) -> DataAccessResult<u64> {
        widget.ok_or(DataAccessError::InvalidArgument("Widget can not be null."))?;
        Err(unreachable())
    }

    async fn delete_widget(&self, _id: i32) -> DataAccessResult<u64> {
        Err(unreachable())
    }

    async fn ping(&self) -> DataAccessResult<()> {
        Err(unreachable())
    }
}

/// Serves the router on an ephemeral port and returns its base url.
pub async fn spawn_app(store: impl WidgetStore + 'static) -> String {
    let router = transport::http::create_router(transport::http::AppState::new(store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}
