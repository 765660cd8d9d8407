//! Session: everything that lives between login and logout.
//!
//! The session owns the API client, the event channel and the notification
//! center. Nothing here is global; a new login builds a new session and
//! logout tears it down.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use taskpulse_core::{
    defaults, AuthSession, NotificationRecord, Reconciler, Result, TaskEventKind, TaskForm, User,
};

use crate::api::ApiClient;
use crate::center::{NotificationCenter, NotificationHandle};
use crate::channel::{ChannelStatus, EventChannel};
use crate::config::ClientConfig;

/// An authenticated dashboard session.
pub struct Session {
    api: ApiClient,
    user: User,
    channel: EventChannel,
    notifications: NotificationHandle,
    center_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Log in with credentials and start a session.
    pub async fn login(config: ClientConfig, email: &str, password: &str) -> Result<Self> {
        let auth = ApiClient::new(&config)?.login(email, password).await?;
        Self::start(config, auth).await
    }

    /// Start a session from an existing token and user.
    ///
    /// If the event channel cannot connect the error is returned and nothing
    /// is left running.
    pub async fn start(config: ClientConfig, auth: AuthSession) -> Result<Self> {
        let api = ApiClient::new(&config)?.with_token(auth.token.clone());

        let (events_tx, events_rx) = mpsc::channel(config.event_queue_capacity);
        let center = NotificationCenter::new(
            Reconciler::new(auth.user.username.clone()),
            config.expiry,
            events_rx,
        );

        let mut channel = EventChannel::new(config.events_url.clone());
        for kind in TaskEventKind::ALL {
            channel.on_event(kind, events_tx.clone());
        }
        drop(events_tx);

        channel.connect(&auth.token).await?;
        let (notifications, center_task) = center.start();

        info!(username = %auth.user.username, "Session started");

        Ok(Self {
            api,
            user: auth.user,
            channel,
            notifications,
            center_task: Some(center_task),
        })
    }

    /// Swap in a new token and reconnect the event channel with it.
    pub async fn reauthenticate(&mut self, token: &str) -> Result<()> {
        self.api.set_token(token);
        self.channel.connect(token).await
    }

    /// Tear the session down. Safe to call more than once.
    pub async fn logout(&mut self) {
        self.channel.disconnect().await;
        self.notifications.shutdown().await;
        if let Some(task) = self.center_task.take() {
            if let Err(e) = task.await {
                warn!(error = ?e, "Notification center ended abnormally");
            }
            info!(username = %self.user.username, "Session ended");
        }
        self.api.clear_token();
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn notifications(&self) -> &NotificationHandle {
        &self.notifications
    }

    pub fn channel_status(&self) -> watch::Receiver<ChannelStatus> {
        self.channel.status()
    }

    pub fn is_active(&self) -> bool {
        self.center_task.is_some()
    }

    /// Show a local success notification.
    pub async fn notify_ok(&self, message: impl Into<String>) {
        self.notifications
            .push(NotificationRecord::success(
                defaults::NOTIFICATION_SUCCESS_TITLE,
                message,
            ))
            .await;
    }

    /// Show a local error notification.
    pub async fn notify_error(&self, message: impl Into<String>) {
        self.notifications
            .push(NotificationRecord::error(
                defaults::NOTIFICATION_ERROR_TITLE,
                message,
            ))
            .await;
    }

    /// Validate and create a task, reporting the outcome as a notification.
    pub async fn create_task(&self, form: &TaskForm) -> Result<()> {
        let result = match form.validate(Some(&self.user)) {
            Ok(new_task) => self.api.create_task(&new_task).await,
            Err(e) => Err(e),
        };
        self.report(result, "Task created successfully").await
    }

    /// Validate and update a task, reporting the outcome as a notification.
    pub async fn update_task(&self, task_id: &str, form: &TaskForm) -> Result<()> {
        let result = match form.validate(Some(&self.user)) {
            Ok(new_task) => self.api.update_task(task_id, &new_task).await,
            Err(e) => Err(e),
        };
        self.report(result, "Task updated successfully").await
    }

    /// Delete a task. Deletions are silent; the caller refreshes its list.
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.api.delete_task(task_id).await
    }

    async fn report(&self, result: Result<()>, success: &str) -> Result<()> {
        match &result {
            Ok(()) => self.notify_ok(success).await,
            Err(e) => self.notify_error(e.user_message()).await,
        }
        result
    }
}
