use crate::capture::is_image_data_uri;
use crate::models::{FoodEntry, Rating};
use crate::presenter::{DateGroup, format_clock_time};
use crate::workout::Celebration;

/// Non-fatal messages passed back to the home page after a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoImage,
    InvalidImage,
    InvalidRating,
    SaveFailed,
}

impl Notice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "no-image" => Some(Notice::NoImage),
            "invalid-image" => Some(Notice::InvalidImage),
            "invalid-rating" => Some(Notice::InvalidRating),
            "save-failed" => Some(Notice::SaveFailed),
            _ => None,
        }
    }

    pub fn redirect_path(self) -> &'static str {
        match self {
            Notice::NoImage => "/?notice=no-image",
            Notice::InvalidImage => "/?notice=invalid-image",
            Notice::InvalidRating => "/?notice=invalid-rating",
            Notice::SaveFailed => "/?notice=save-failed",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Notice::NoImage => "No photo was captured, so nothing was logged.",
            Notice::InvalidImage => "That photo couldn't be read, so nothing was logged.",
            Notice::InvalidRating => "Pick a rating to log that meal.",
            Notice::SaveFailed => "Couldn't save that meal. Storage may be full.",
        }
    }
}

pub fn render_index(
    today: &[&FoodEntry],
    notice: Option<Notice>,
    celebration: Option<&Celebration>,
) -> String {
    let notice_html = notice
        .map(|notice| format!(r#"<p class="notice">{}</p>"#, notice.message()))
        .unwrap_or_default();

    let celebration_html = celebration
        .map(|celebration| {
            format!(
                r#"<section class="celebration"><h2>Workout complete</h2><p>{} &middot; +{} pts &middot; {} done, {}</p></section>"#,
                escape(celebration.title),
                celebration.points,
                celebration.progress.percent,
                celebration.progress.time_left,
            )
        })
        .unwrap_or_default();

    let strip = if today.is_empty() {
        r#"<p class="empty">Nothing logged yet today.</p>"#.to_string()
    } else {
        today
            .iter()
            .map(|entry| render_strip_item(entry))
            .collect::<Vec<_>>()
            .join("\n")
    };

    page(
        "Today",
        &format!(
            "{notice_html}{celebration_html}{}\n<section class=\"food-list\">\n{strip}\n</section>\n{}",
            HOME_HEADER, CAPTURE_FORM
        ),
    )
}

pub fn render_food_log(groups: &[DateGroup<'_>]) -> String {
    if groups.is_empty() {
        return page(
            "Food log",
            r#"<header><h1>Food log</h1><a href="/">Back</a></header>
<div class="food-log-empty"><p>No meals logged yet.</p></div>"#,
        );
    }

    let mut body = String::from(r#"<header><h1>Food log</h1><a href="/">Back</a></header>"#);
    body.push_str("\n<section class=\"food-log-entries\">\n");
    for group in groups {
        body.push_str(&format!(
            "<div class=\"food-log-date\">{}</div>\n",
            escape(&group.label)
        ));
        for entry in &group.entries {
            body.push_str(&render_log_entry(entry));
            body.push('\n');
        }
    }
    body.push_str("</section>");

    page("Food log", &body)
}

fn render_strip_item(entry: &FoodEntry) -> String {
    format!(
        r#"<div class="food-list-item">
  <div class="food-image"{}></div>
  <div class="food-info"><div class="food-name">Logged meal</div><div class="food-detail">{}</div></div>
  <div class="food-time">{}</div>
</div>"#,
        image_style(&entry.image),
        entry.rating.strip_caption(),
        format_clock_time(entry.timestamp),
    )
}

fn render_log_entry(entry: &FoodEntry) -> String {
    let thumb = match entry.rating {
        Rating::Good => "&#128077;",
        Rating::Bad => "&#128078;",
    };
    format!(
        r#"<div class="food-log-entry">
  <div class="food-image"{}></div>
  <div class="food-info"><div class="food-time">{}</div><div class="food-detail">{}</div></div>
  <div class="food-rating {}">{}</div>
</div>"#,
        image_style(&entry.image),
        format_clock_time(entry.timestamp),
        entry.rating.log_caption(),
        entry.rating,
        thumb,
    )
}

/// Stored images that are not plain base64 data URIs get no background, since
/// HTML escaping does not protect the CSS `url()` context.
fn image_style(image: &str) -> String {
    if is_image_data_uri(image) {
        format!(r#" style="background-image: url('{image}')""#)
    } else {
        String::new()
    }
}

fn page(title: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{BODY}}", body)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const HOME_HEADER: &str = r#"<header>
  <h1>Today's meals</h1>
  <a href="/food-log">Full log</a>
</header>"#;

const CAPTURE_FORM: &str = r#"<form class="capture" method="post" action="/food-log/capture">
  <label class="camera">
    <input id="photo" type="file" accept="image/*" capture="environment" />
    <span>Snap a meal</span>
  </label>
  <input id="image" type="hidden" name="image" value="" />
  <img id="preview" alt="" hidden />
  <div class="ratings">
    <button class="good" type="submit" name="rating" value="good">Healthy</button>
    <button class="bad" type="submit" name="rating" value="bad">Could be better</button>
  </div>
</form>
<script>
  const MAX_EDGE = 1280;
  document.getElementById('photo').addEventListener('change', (event) => {
    const file = event.target.files[0];
    if (!file) return;
    const url = URL.createObjectURL(file);
    const img = new Image();
    img.onload = () => {
      const scale = Math.min(1, MAX_EDGE / Math.max(img.width, img.height));
      const canvas = document.createElement('canvas');
      canvas.width = Math.round(img.width * scale);
      canvas.height = Math.round(img.height * scale);
      canvas.getContext('2d').drawImage(img, 0, 0, canvas.width, canvas.height);
      URL.revokeObjectURL(url);
      const data = canvas.toDataURL('image/jpeg', 0.8);
      document.getElementById('image').value = data;
      const preview = document.getElementById('preview');
      preview.src = data;
      preview.hidden = false;
    };
    img.src = url;
  });
</script>"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #f4f5f6;
      --ink: #1d1f22;
      --accent: #14e25a;
      --muted: #6b6f76;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Helvetica Neue", sans-serif;
      display: grid;
      place-items: start center;
      padding: 24px 16px 48px;
    }

    main {
      width: min(560px, 100%);
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      align-items: baseline;
      justify-content: space-between;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    .notice {
      margin: 0;
      padding: 12px 16px;
      border-radius: 12px;
      background: #fff3cd;
    }

    .celebration {
      padding: 16px;
      border-radius: 16px;
      background: var(--accent);
      color: white;
    }

    .celebration h2 {
      margin: 0 0 4px;
    }

    .food-list,
    .food-log-entries {
      display: flex;
      flex-direction: column;
      gap: 12px;
    }

    .food-list-item,
    .food-log-entry {
      display: flex;
      align-items: center;
      gap: 12px;
      padding: 12px;
      border-radius: 16px;
      background: var(--card);
    }

    .food-image {
      width: 56px;
      height: 56px;
      border-radius: 12px;
      background-size: cover;
      background-position: center;
    }

    .food-info {
      flex: 1;
    }

    .food-detail,
    .food-time,
    .empty {
      color: var(--muted);
    }

    .food-log-date {
      font-weight: 600;
      margin-top: 8px;
    }

    .food-rating.good {
      color: var(--accent);
    }

    .capture {
      display: grid;
      gap: 12px;
    }

    .capture img {
      width: 100%;
      border-radius: 16px;
    }

    .ratings {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 14px;
      font-weight: 600;
      cursor: pointer;
    }

    button.good {
      background: var(--accent);
      color: white;
    }
  </style>
</head>
<body>
  <main>
{{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(image: &str) -> FoodEntry {
        FoodEntry {
            id: "x".to_string(),
            image: image.to_string(),
            rating: Rating::Bad,
            timestamp: 0,
        }
    }

    #[test]
    fn index_drops_background_for_non_data_uri_images() {
        let tampered = entry("data:image/png;base64,AA'); background: red; x: url('");
        let html = render_index(&[&tampered], None, None);
        assert!(!html.contains("background: red"));
        assert!(!html.contains("background-image: url("));
        assert!(html.contains("Could be better"));

        let ok = entry("data:image/png;base64,AAAA");
        let html = render_index(&[&ok], None, None);
        assert!(html.contains("background-image: url('data:image/png;base64,AAAA')"));
    }

    #[test]
    fn index_shows_notice_and_empty_strip() {
        let html = render_index(&[], Notice::parse("save-failed"), None);
        assert!(html.contains("Storage may be full"));
        assert!(html.contains("Nothing logged yet today."));
        assert_eq!(Notice::parse("bogus"), None);
    }

    #[test]
    fn food_log_renders_groups_in_order() {
        let a = entry("a");
        let b = entry("b");
        let groups = vec![
            DateGroup {
                label: "Today".to_string(),
                entries: vec![&a],
            },
            DateGroup {
                label: "Yesterday".to_string(),
                entries: vec![&b],
            },
        ];
        let html = render_food_log(&groups);
        let today = html.find(">Today<").unwrap();
        let yesterday = html.find(">Yesterday<").unwrap();
        assert!(today < yesterday);
        assert!(html.contains("Could improve"));
    }

    #[test]
    fn empty_food_log_shows_empty_state() {
        assert!(render_food_log(&[]).contains("No meals logged yet."));
    }
}
