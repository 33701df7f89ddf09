//! Remote task-service client.
//!
//! `TaskApi` is the seam between the lifecycle core and the HTTP service;
//! `HttpApi` is the production implementation over a blocking `reqwest`
//! client. Non-2xx responses are failures even when a body is present, and
//! every request carries the bounded timeouts from `ApiConfig`.

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::task::{Area, Task};

/// Payload for `PUT /tareas/{id}/solucion`.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionUpdate {
    pub solucion: String,
    pub asignado: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_comp: Option<DateTime<Utc>>,
}

/// Payload for `POST /api/guardias`. One record per visited service.
#[derive(Debug, Clone, Serialize)]
pub struct GuardVisitRecord {
    pub personal_id: u64,
    pub servicio: String,
    pub fecha_hora: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

/// The consumed surface of the remote service, one method per endpoint.
pub trait TaskApi {
    fn tasks_by_area(&self, area: &str) -> Result<Vec<Task>>;
    fn tasks_by_user(&self, user: &str) -> Result<Vec<Task>>;
    fn all_tasks(&self) -> Result<Vec<Task>>;
    fn areas(&self) -> Result<Vec<Area>>;
    fn put_solution(&self, id: u64, update: &SolutionUpdate) -> Result<()>;
    fn put_observation(&self, id: u64, observation: &str) -> Result<()>;
    fn put_finished(&self, id: u64) -> Result<()>;
    fn put_rating(&self, id: u64, rating: u8) -> Result<()>;
    fn post_guard_visit(&self, visit: &GuardVisitRecord) -> Result<()>;
}

/// Production implementation over HTTP/JSON.
pub struct HttpApi {
    config: ApiConfig,
    client: Client,
}

impl HttpApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(HttpApi { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Server {
                status: status.as_u16(),
            })
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(%path, "GET");
        let response = Self::check(self.client.get(self.url(path)).send()?)?;
        response
            .json()
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        debug!(%path, "PUT");
        Self::check(self.client.put(self.url(path)).json(body).send()?)?;
        Ok(())
    }

    fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        debug!(%path, "POST");
        Self::check(self.client.post(self.url(path)).json(body).send()?)?;
        Ok(())
    }
}

impl TaskApi for HttpApi {
    fn tasks_by_area(&self, area: &str) -> Result<Vec<Task>> {
        self.get_json(&format!("/tareas/{area}"))
    }

    fn tasks_by_user(&self, user: &str) -> Result<Vec<Task>> {
        self.get_json(&format!("/tareas/usuario/{user}"))
    }

    fn all_tasks(&self) -> Result<Vec<Task>> {
        self.get_json("/tareas")
    }

    fn areas(&self) -> Result<Vec<Area>> {
        self.get_json("/areas")
    }

    fn put_solution(&self, id: u64, update: &SolutionUpdate) -> Result<()> {
        self.put_json(&format!("/tareas/{id}/solucion"), update)
    }

    fn put_observation(&self, id: u64, observation: &str) -> Result<()> {
        self.put_json(
            &format!("/tareas/{id}/observacion"),
            &json!({ "observacion": observation }),
        )
    }

    fn put_finished(&self, id: u64) -> Result<()> {
        self.put_json(&format!("/tareas/{id}/fin"), &json!({ "fin": true }))
    }

    fn put_rating(&self, id: u64, rating: u8) -> Result<()> {
        self.put_json(
            &format!("/tareas/{id}/calificacion"),
            &json!({ "calificacion": rating }),
        )
    }

    fn post_guard_visit(&self, visit: &GuardVisitRecord) -> Result<()> {
        self.post_json("/api/guardias", visit)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// One recorded remote call, in issue order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        TasksByArea(String),
        TasksByUser(String),
        AllTasks,
        Areas,
        PutSolution(u64),
        PutObservation(u64),
        PutFinished(u64),
        PutRating(u64, u8),
        PostGuardVisit(String),
    }

    /// Scripted in-memory stand-in for the remote service.
    #[derive(Default)]
    pub struct FakeApi {
        pub tasks: Vec<Task>,
        pub areas: Vec<Area>,
        /// When set, every call fails with this HTTP status.
        pub fail_status: Cell<Option<u16>>,
        /// Fail the guard-visit POST for this service only.
        pub fail_guard_service: Option<String>,
        pub calls: RefCell<Vec<Call>>,
    }

    impl FakeApi {
        pub fn with_tasks(tasks: Vec<Task>) -> Self {
            FakeApi {
                tasks,
                ..Default::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn record(&self, call: Call) -> Result<()> {
            self.calls.borrow_mut().push(call);
            match self.fail_status.get() {
                Some(status) => Err(Error::Server { status }),
                None => Ok(()),
            }
        }
    }

    impl TaskApi for FakeApi {
        fn tasks_by_area(&self, area: &str) -> Result<Vec<Task>> {
            self.record(Call::TasksByArea(area.to_string()))?;
            Ok(self
                .tasks
                .iter()
                .filter(|t| t.area == area)
                .cloned()
                .collect())
        }

        fn tasks_by_user(&self, user: &str) -> Result<Vec<Task>> {
            self.record(Call::TasksByUser(user.to_string()))?;
            Ok(self
                .tasks
                .iter()
                .filter(|t| t.requester == user)
                .cloned()
                .collect())
        }

        fn all_tasks(&self) -> Result<Vec<Task>> {
            self.record(Call::AllTasks)?;
            Ok(self.tasks.clone())
        }

        fn areas(&self) -> Result<Vec<Area>> {
            self.record(Call::Areas)?;
            Ok(self.areas.clone())
        }

        fn put_solution(&self, id: u64, _update: &SolutionUpdate) -> Result<()> {
            self.record(Call::PutSolution(id))
        }

        fn put_observation(&self, id: u64, _observation: &str) -> Result<()> {
            self.record(Call::PutObservation(id))
        }

        fn put_finished(&self, id: u64) -> Result<()> {
            self.record(Call::PutFinished(id))
        }

        fn put_rating(&self, id: u64, rating: u8) -> Result<()> {
            self.record(Call::PutRating(id, rating))
        }

        fn post_guard_visit(&self, visit: &GuardVisitRecord) -> Result<()> {
            self.record(Call::PostGuardVisit(visit.servicio.clone()))?;
            if self.fail_guard_service.as_deref() == Some(visit.servicio.as_str()) {
                return Err(Error::Server { status: 500 });
            }
            Ok(())
        }
    }
}
