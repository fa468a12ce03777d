// HTML fragments for the server-rendered pages.
// Placeholders are `{name}` and are filled by `render::fill` in a single pass,
// so substituted text is never re-scanned for placeholders.

pub const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Career Quiz</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 0 auto; padding: 1rem; }
nav { display: flex; justify-content: space-between; align-items: center; gap: 1rem; }
.alert { padding: 0.75rem; border: 1px solid #c33; color: #c33; }
.card { border: 1px solid #ddd; padding: 0.75rem; margin: 0.5rem 0; }
table { border-collapse: collapse; width: 100%; }
td, th { border-bottom: 1px solid #eee; padding: 0.5rem; text-align: left; vertical-align: top; }
</style>
</head>
<body>
<nav><a href="/">Career Quiz</a> <a href="/history">History</a> <div>{auth_bar}</div></nav>
<main>
{content}
</main>
</body>
</html>
"#;

pub const AUTH_SIGNED_IN: &str = r#"<span>Hello, {name}</span>
<form method="post" action="/auth/logout" style="display:inline"><button type="submit">Logout</button></form>"#;

pub const AUTH_SIGNED_OUT: &str = r#"<details>
<summary>Login / Sign Up</summary>
<form method="post" action="/auth/login">
<input type="email" name="email" placeholder="Email" required>
<input type="password" name="password" placeholder="Password" required>
<button type="submit">Login</button>
</form>
<form method="post" action="/auth/signup">
<input type="text" name="display_name" placeholder="Name">
<input type="email" name="email" placeholder="Email" required>
<input type="password" name="password" placeholder="Password" required>
<button type="submit">Sign Up</button>
</form>
</details>"#;

pub const ALERT: &str = r#"<p class="alert" role="alert">{message}</p>"#;

pub const QUIZ_FORM: &str = r#"<h1>Find your career match</h1>
{alert}
<form method="post" action="/quiz" onsubmit="this.querySelector('button[type=submit]').disabled = true">
{questions}
<button type="submit">Get my recommendation</button>
</form>"#;

pub const QUESTION: &str = r#"<fieldset>
<legend>{prompt}{hint}</legend>
{input}
</fieldset>"#;

pub const CHECKBOX: &str =
    r#"<label><input type="checkbox" name="{key}" value="{value}"> {value}</label><br>"#;

pub const RADIO: &str =
    r#"<label><input type="radio" name="{key}" value="{value}"> {value}</label><br>"#;

pub const TEXT_INPUT: &str = r#"<input type="text" name="{key}" size="60"{required}>"#;

pub const SCALE_INPUT: &str = r#"<input type="number" name="{key}" min="{min}" max="{max}">"#;

pub const RESULT: &str = r#"<h1>Your recommendation</h1>
<table>
<thead><tr><th></th><th>Job title</th><th>Description</th></tr></thead>
<tbody>
{rows}
</tbody>
</table>
<h2>Why these jobs?</h2>
<p>{ai_summary}</p>
<p><a href="/">Take the quiz again</a> · <a href="/history">See history</a></p>"#;

pub const RESULT_ROW: &str =
    r#"<tr><th scope="row">{label}</th><td>{job_title}</td><td>{description}</td></tr>"#;

pub const HISTORY: &str = r#"<h1>History</h1>
<section>
<h2>Recent on this device</h2>
{local}
</section>
<section>
<h2>Previous recommendations</h2>
{remote}
</section>"#;

pub const LOCAL_HISTORY_LIST: &str = r#"<ol>
{items}
</ol>
<form method="post" action="/history/clear"><button type="submit">Clear</button></form>"#;

pub const LOCAL_HISTORY_ITEM: &str = r#"<li>{text} <small>{ts}</small></li>"#;

pub const REMOTE_CARD: &str = r#"<div class="card">
<strong>{best_match}</strong> <small>{ts}</small>
<p>Also consider: {alternatives}</p>
<p>{ai_summary}</p>
</div>"#;

pub const ERROR_PAGE: &str = r#"<h1>Something went wrong</h1>
{alert}
<p><a href="/">Back to the quiz</a></p>"#;
