use maud::{html, Markup, PreEscaped, DOCTYPE};

// Mail clients drop external stylesheets, so the styles travel inline.
const EMAIL_CSS: &str = r#"
body { font-family: Arial, sans-serif; margin: 20px; color: #333; }
.header { background-color: #f4f4f4; padding: 20px; border-radius: 5px; }
.listing { border: 1px solid #ddd; margin: 10px 0; padding: 15px; border-radius: 5px; }
.price { font-size: 18px; font-weight: bold; color: #2c5aa0; }
.address { font-size: 16px; margin: 5px 0; }
.details { color: #666; margin: 5px 0; }
.url { margin-top: 10px; }
.url a { color: #2c5aa0; text-decoration: none; }
.empty { padding: 20px; color: #666; }
.summary { background-color: #e8f4f8; padding: 15px; border-radius: 5px; margin-top: 20px; }
"#;

pub fn email_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(EMAIL_CSS)) }
            }
            body {
                (content)
            }
        }
    }
}
