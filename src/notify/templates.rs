//! Message bodies for booking notifications.

use chrono::{DateTime, Utc};

use super::{MentorApplication, Notification};
use crate::entity::{session, user};

fn when(instant: DateTime<Utc>) -> String {
    instant.format("%A, %B %-d, %Y at %H:%M UTC").to_string()
}

/// Minimal escaping for user-supplied text placed in HTML bodies.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn message(to: &str, subject: &str, html_body: String) -> Notification {
    Notification {
        to: to.to_string(),
        subject: subject.to_string(),
        html_body,
        attachments: Vec::new(),
    }
}

pub fn request_submitted(session: &session::Model, mentee: &user::Model, mentor: &user::Model) -> Notification {
    message(
        &mentee.email,
        "Session Request Submitted",
        format!(
            "<h3>Your session request has been submitted!</h3>\
             <p><strong>Mentor:</strong> {}</p>\
             <p><strong>Time:</strong> {}</p>\
             <p><strong>Topic:</strong> {}</p>\
             <p><strong>Status:</strong> Pending mentor approval</p>\
             <p>You will receive the meeting link once the mentor confirms.</p>",
            escape(&mentor.full_name),
            when(session.start_time),
            escape(&session.topic),
        ),
    )
}

pub fn action_required(session: &session::Model, mentee: &user::Model, mentor: &user::Model) -> Notification {
    message(
        &mentor.email,
        "New Session Request - Action Required",
        format!(
            "<h3>You have a new session request!</h3>\
             <p><strong>Mentee:</strong> {}</p>\
             <p><strong>Time:</strong> {}</p>\
             <p><strong>Topic:</strong> {}</p>\
             <p>Please log in to your dashboard to confirm or reject this request.</p>",
            escape(&mentee.full_name),
            when(session.start_time),
            escape(&session.topic),
        ),
    )
}

pub fn confirmed_for_mentee(session: &session::Model, mentee: &user::Model, mentor: &user::Model) -> Notification {
    let link = session.meeting_link.as_deref().unwrap_or_default();
    message(
        &mentee.email,
        "Session Confirmed! - Meeting Link Inside",
        format!(
            "<h2>Great news! Your session has been confirmed!</h2>\
             <p><strong>Mentor:</strong> {}</p>\
             <p><strong>Date &amp; Time:</strong> {}</p>\
             <p><strong>Topic:</strong> {}</p>\
             <h3>Join Meeting</h3>\
             <p><a href=\"{}\">Click to Join Meeting</a></p>\
             <p><strong>Meeting ID:</strong> {}<br><strong>Password:</strong> {}</p>\
             <ul><li>Join 2-3 minutes early to test your audio/video</li>\
             <li>Prepare any questions you want to discuss</li></ul>",
            escape(&mentor.full_name),
            when(session.start_time),
            escape(&session.topic),
            escape(link),
            escape(session.meeting_id.as_deref().unwrap_or_default()),
            escape(session.meeting_password.as_deref().unwrap_or_default()),
        ),
    )
}

pub fn confirmed_for_mentor(session: &session::Model, mentee: &user::Model, mentor: &user::Model) -> Notification {
    message(
        &mentor.email,
        "Session Confirmed",
        format!(
            "<h2>Session Confirmed</h2>\
             <p>You have confirmed the session with <strong>{}</strong></p>\
             <p><strong>Date &amp; Time:</strong> {}</p>\
             <p><strong>Topic:</strong> {}</p>\
             <p><a href=\"{}\">Join Meeting</a></p>",
            escape(&mentee.full_name),
            when(session.start_time),
            escape(&session.topic),
            escape(session.meeting_link.as_deref().unwrap_or_default()),
        ),
    )
}

pub fn rejected(
    session: &session::Model,
    mentee: &user::Model,
    mentor: &user::Model,
    client_url: &str,
) -> Notification {
    message(
        &mentee.email,
        "Session Request Update",
        format!(
            "<h3>Session Request Status Update</h3>\
             <p>Unfortunately, your session request with <strong>{}</strong> could not be confirmed.</p>\
             <p><strong>Requested Time:</strong> {}</p>\
             <p><strong>Reason:</strong> {}</p>\
             <p>Please try booking another available slot with this mentor or explore other mentors on the platform.</p>\
             <p><a href=\"{}/search\">Find Other Mentors</a></p>",
            escape(&mentor.full_name),
            when(session.start_time),
            escape(session.rejection_reason.as_deref().unwrap_or_default()),
            escape(client_url.trim_end_matches('/')),
        ),
    )
}

pub fn cancelled(session: &session::Model, recipient: &user::Model) -> Notification {
    message(
        &recipient.email,
        "Session Cancelled",
        format!(
            "<p>The session scheduled for {} has been cancelled.</p>\
             <p><strong>Topic:</strong> {}</p>",
            when(session.start_time),
            escape(&session.topic),
        ),
    )
}

pub fn mentor_application(admin_email: &str, application: &MentorApplication) -> Notification {
    message(
        admin_email,
        "New Mentor Application",
        format!(
            "<p><strong>{}</strong> from <strong>{}</strong> applied to be a mentor.</p>",
            escape(&application.full_name),
            escape(&application.university),
        ),
    )
}
