//! Server-rendered HTML pages.
//!
//! Templates live in `resources/templates` and are compiled into the binary.
//! `render` takes a view plus the page frame (viewer and pending flashes),
//! builds a `tera::Context` from both and renders the view's template.
//! Tera autoescapes every `.html` template, so interpolated values never
//! need manual escaping.

use std::sync::LazyLock;

use axum::response::Html;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::APP_NAME;
use crate::crypto::MIN_PASSWORD_LENGTH;
use crate::dashboard::{AdminOverview, DoctorOverview, PatientOverview};
use crate::models::*;
use crate::session_cache::Flash;

/// chrono format for appointment slots, applied by tera's `date` filter.
const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

const TEMPLATES: [(&str, &str); 11] = [
    ("base.html", include_str!("../../resources/templates/base.html")),
    ("index.html", include_str!("../../resources/templates/index.html")),
    ("login.html", include_str!("../../resources/templates/login.html")),
    ("register.html", include_str!("../../resources/templates/register.html")),
    ("admin_dashboard.html", include_str!("../../resources/templates/admin_dashboard.html")),
    ("add_doctor.html", include_str!("../../resources/templates/add_doctor.html")),
    ("patient_dashboard.html", include_str!("../../resources/templates/patient_dashboard.html")),
    ("book_appointment.html", include_str!("../../resources/templates/book_appointment.html")),
    ("doctor_dashboard.html", include_str!("../../resources/templates/doctor_dashboard.html")),
    ("complete_appointment.html", include_str!("../../resources/templates/complete_appointment.html")),
    ("message.html", include_str!("../../resources/templates/message.html")),
];

static ENGINE: LazyLock<Result<Tera, tera::Error>> = LazyLock::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;
    Ok(tera)
});

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Template set failed to load: {0}")]
    Load(String),
    #[error("Rendering {template} failed: {source}")]
    Render {
        template: &'static str,
        #[source]
        source: tera::Error,
    },
}

/// Who is looking at the page.
#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub name: String,
    /// Human label of the role.
    pub role: &'static str,
    /// The role's dashboard.
    pub home: &'static str,
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name().to_string(),
            role: user.role.label(),
            home: user.role.landing_path(),
        }
    }
}

/// Frame shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub viewer: Option<Viewer>,
    pub flashes: Vec<Flash>,
}

pub enum View<'a> {
    Index,
    Login,
    Register,
    AdminDashboard(&'a AdminOverview),
    AddDoctor(&'a [Department]),
    PatientDashboard(&'a PatientOverview),
    BookAppointment(&'a DoctorSummary),
    DoctorDashboard(&'a DoctorOverview),
    CompleteAppointment(&'a AppointmentDetail),
    NotFound(&'a str),
    Error(&'a str),
}

impl View<'_> {
    fn template(&self) -> &'static str {
        match self {
            View::Index => "index.html",
            View::Login => "login.html",
            View::Register => "register.html",
            View::AdminDashboard(_) => "admin_dashboard.html",
            View::AddDoctor(_) => "add_doctor.html",
            View::PatientDashboard(_) => "patient_dashboard.html",
            View::BookAppointment(_) => "book_appointment.html",
            View::DoctorDashboard(_) => "doctor_dashboard.html",
            View::CompleteAppointment(_) => "complete_appointment.html",
            View::NotFound(_) | View::Error(_) => "message.html",
        }
    }

    /// Insert the view's named values.
    fn fill(&self, context: &mut Context) {
        match self {
            View::Index | View::Login | View::Register => {}
            View::AdminDashboard(overview) => context.insert("overview", overview),
            View::AddDoctor(departments) => context.insert("departments", departments),
            View::PatientDashboard(overview) => context.insert("overview", overview),
            View::BookAppointment(doctor) => context.insert("doctor", doctor),
            View::DoctorDashboard(overview) => context.insert("overview", overview),
            View::CompleteAppointment(detail) => context.insert("detail", detail),
            View::NotFound(message) => {
                context.insert("heading", "Not found");
                context.insert("message", message);
            }
            View::Error(message) => {
                context.insert("heading", "Something went wrong");
                context.insert("message", message);
            }
        }
    }
}

pub fn render(view: View<'_>, page: &Page) -> Result<Html<String>, ViewError> {
    let engine = ENGINE
        .as_ref()
        .map_err(|e| ViewError::Load(e.to_string()))?;

    let mut context = Context::new();
    context.insert("app_name", APP_NAME);
    context.insert("slot_format", SLOT_FORMAT);
    context.insert("min_password_length", &MIN_PASSWORD_LENGTH);
    context.insert("viewer", &page.viewer);
    context.insert("flashes", &page.flashes);
    view.fill(&mut context);

    let template = view.template();
    engine
        .render(template, &context)
        .map(Html)
        .map_err(|source| ViewError::Render { template, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_cache::FlashKind;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn body(view: View<'_>, page: &Page) -> String {
        render(view, page).unwrap().0
    }

    fn summary(full_name: &str, is_approved: bool) -> DoctorSummary {
        DoctorSummary {
            doctor: Doctor {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                department_id: None,
                specialization: None,
                contact: None,
                is_active: true,
                is_approved,
            },
            username: "house".into(),
            full_name: full_name.into(),
            email: "house@ppth.test".into(),
            department: None,
        }
    }

    #[test]
    fn every_view_renders() {
        let overview = AdminOverview {
            doctors: vec![summary("Gregory House", true)],
            patients: Vec::new(),
            appointments: Vec::new(),
        };
        let departments = [Department {
            id: Uuid::new_v4(),
            name: "ENT".into(),
        }];
        for view in [
            View::Index,
            View::Login,
            View::Register,
            View::AdminDashboard(&overview),
            View::AddDoctor(&departments),
            View::NotFound("Doctor not found."),
            View::Error("boom"),
        ] {
            let html = body(view, &Page::default());
            assert!(html.starts_with("<!DOCTYPE html>"));
            assert!(html.contains(APP_NAME));
        }
    }

    #[test]
    fn flashes_rendered_escaped() {
        let page = Page {
            viewer: None,
            flashes: vec![Flash::new(FlashKind::Danger, "<b>bad</b>")],
        };
        let html = body(View::Login, &page);
        assert!(html.contains("flash-danger"));
        assert!(html.contains("&lt;b&gt;bad&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>bad</b>"));
    }

    #[test]
    fn nav_reflects_viewer() {
        let anonymous = body(View::Index, &Page::default());
        assert!(anonymous.contains("href=\"/register\""));

        let page = Page {
            viewer: Some(Viewer {
                name: "Dr <House>".into(),
                role: Role::Doctor.label(),
                home: Role::Doctor.landing_path(),
            }),
            flashes: Vec::new(),
        };
        let html = body(View::Index, &page);
        assert!(html.contains("href=\"/doctor\""));
        assert!(html.contains("Dr &lt;House&gt;"));
        assert!(html.contains("/logout"));
    }

    #[test]
    fn booking_form_targets_doctor() {
        let doctor = summary("Gregory House", true);
        let html = body(View::BookAppointment(&doctor), &Page::default());
        assert!(html.contains(&format!("action=\"/patient/book/{}\"", doctor.doctor.id)));
        assert!(html.contains("datetime-local"));
        assert!(html.contains("Department: -"));
    }

    #[test]
    fn admin_rows_offer_the_opposite_flag() {
        let pending = summary("Pending Doc", false);
        let overview = AdminOverview {
            doctors: vec![pending.clone()],
            patients: Vec::new(),
            appointments: Vec::new(),
        };
        let html = body(View::AdminDashboard(&overview), &Page::default());
        assert!(html.contains(&format!("/admin/doctors/{}/status", pending.doctor.id)));
        assert!(html.contains("Approve"));
        assert!(html.contains("name=\"is_approved\" value=\"true\""));
        assert!(html.contains("Deactivate"));
    }

    #[test]
    fn slots_use_display_format() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let detail = AppointmentDetail {
            appointment: Appointment {
                id: Uuid::new_v4(),
                patient_id: Uuid::new_v4(),
                doctor_id: Uuid::new_v4(),
                start,
                end: start + chrono::Duration::minutes(30),
                reason: Some("Checkup & <tests>".into()),
                status: AppointmentStatus::Booked,
                created_at: start,
            },
            doctor_name: "House".into(),
            patient_name: "Ann".into(),
        };
        let html = body(View::CompleteAppointment(&detail), &Page::default());
        assert!(html.contains("2025-01-01 09:00 to 2025-01-01 09:30"));
        assert!(html.contains("Checkup &amp; &lt;tests&gt;"));
    }
}
