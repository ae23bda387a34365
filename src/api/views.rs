//! Server-rendered HTML

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::auth::UserIdentity;

/// Values shown on the home page
#[derive(Debug, Default)]
pub struct HomePage<'a> {
    pub user: Option<&'a UserIdentity>,
    pub india_time: Option<String>,
    pub pattern_lines: Option<Vec<String>>,
    pub error: Option<String>,
}

impl HomePage<'_> {
    pub fn render(&self) -> String {
        let body = match self.user {
            Some(user) => self.render_signed_in(user),
            None => concat!(
                "<p>Sign in to generate a pattern.</p>\n",
                "<a class=\"button\" href=\"/login\">Sign in with Google</a>\n"
            )
            .to_string(),
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Pattern Portal</title>
</head>
<body>
<h1>Pattern Portal</h1>
{body}</body>
</html>
"#
        )
    }

    fn render_signed_in(&self, user: &UserIdentity) -> String {
        let mut html = String::new();

        html.push_str("<div class=\"profile\">\n");
        if !user.picture.is_empty() {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"avatar\" width=\"48\" height=\"48\">\n",
                encode_double_quoted_attribute(&user.picture)
            ));
        }
        html.push_str(&format!(
            "<p>Welcome, <strong>{}</strong> ({})</p>\n",
            encode_text(&user.name),
            encode_text(&user.email)
        ));
        html.push_str("<a href=\"/logout\">Logout</a>\n</div>\n");

        if let Some(time) = &self.india_time {
            html.push_str(&format!(
                "<p class=\"time\">Current time in India: {}</p>\n",
                encode_text(time)
            ));
        }

        html.push_str(concat!(
            "<form method=\"post\" action=\"/\">\n",
            "<label for=\"lines\">Number of lines (1-100):</label>\n",
            "<input type=\"text\" id=\"lines\" name=\"lines\" required>\n",
            "<button type=\"submit\">Generate</button>\n",
            "</form>\n"
        ));

        if let Some(error) = &self.error {
            html.push_str(&format!(
                "<p class=\"error\">{}</p>\n",
                encode_text(error)
            ));
        }

        if let Some(lines) = &self.pattern_lines {
            html.push_str("<pre class=\"pattern\">");
            html.push_str(&encode_text(&lines.join("\n")));
            html.push_str("</pre>\n");
        }

        html
    }
}
