//! HTML for the two screens

use crate::screen::ScreenSnapshot;
use capture_workflow::ViewState;
use gallery::GalleryState;
use notifications::NotificationKind;
use std::fmt::Write;

const INSTRUCTIONS: &str = "Tap to select the view and upload the images when complete";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

/// Capture screen (`/`)
pub fn capture_page(snapshot: &ScreenSnapshot) -> String {
    let mut body = String::new();

    if let Some(notification) = &snapshot.notification {
        let class = match notification.kind {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        };
        let _ = writeln!(
            body,
            "<div class=\"notification {}\" role=\"status\">{}</div>",
            class,
            escape(&notification.message)
        );
    }

    if snapshot.camera_live {
        body.push_str("<img class=\"preview\" src=\"/preview.jpg\" alt=\"Live camera\">\n");
    }

    body.push_str("<nav class=\"views\">\n");
    for view in &snapshot.session.views {
        let state = match view.state {
            ViewState::Unclicked => "unclicked",
            ViewState::Preview => "preview",
            ViewState::Captured => "captured",
        };
        let active = if view.active { " active" } else { "" };
        let _ = writeln!(
            body,
            "<form method=\"post\" action=\"/views/{}/tap\" class=\"view {}{}\">\
             <button type=\"submit\">View {}</button>",
            view.index,
            state,
            active,
            view.index + 1
        );
        if let Some(image) = &view.image {
            let _ = write!(
                body,
                "<img src=\"{}\" alt=\"View {} capture\">",
                escape(image),
                view.index + 1
            );
        }
        body.push_str("</form>\n");
    }
    body.push_str("</nav>\n");

    let disabled = if snapshot.upload_enabled { "" } else { " disabled" };
    let label = if snapshot.uploading { "Uploading..." } else { "Upload" };
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/upload\"><button type=\"submit\"{}>{}</button></form>",
        disabled, label
    );
    let _ = writeln!(body, "<p>{}</p>", INSTRUCTIONS);
    body.push_str("<a href=\"/gallery\">Gallery</a>\n");

    page("Capture", &body)
}

/// Gallery screen (`/gallery`)
pub fn gallery_page(state: &GalleryState) -> String {
    let mut body = String::from("<h1>Uploaded Session Images</h1>\n");

    if let Some(message) = state.message() {
        let _ = writeln!(body, "<p class=\"message\">{}</p>", escape(message));
    }

    for entry in state.entries() {
        let id = escape(&entry.session_id);
        let _ = writeln!(body, "<section class=\"session\">\n<p>Session: {}</p>", id);
        for (n, view) in [&entry.view1, &entry.view2].into_iter().enumerate() {
            let _ = writeln!(
                body,
                "<img src=\"{}\" alt=\"View {} - {}\">",
                escape(view.as_deref().unwrap_or("")),
                n + 1,
                id
            );
        }
        body.push_str("</section>\n");
    }

    body.push_str("<a href=\"/\">Back to capture</a>\n");
    page("Gallery", &body)
}
