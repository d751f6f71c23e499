//! Server-rendered panel pages
//!
//! Turns the view models from [`crate::render`] into HTML: the persistent
//! side navigation over all registered schemas, the row listing with its
//! edit/delete actions, the create/edit/view forms and the login page.
//! Gateway and validation errors surface as inline banners; an unknown
//! table key renders a visible error page instead of crashing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use std::collections::HashMap;

use crate::database::traits::{CrudGateway, RowId};
use crate::layer::AdminState;
use crate::render::form::{
    build_form, delete_and_refresh, load_related_options, submit_and_refresh, FormMode,
    FormView, SubmitAction,
};
use crate::render::list::{build_table, CellView, TableView};
use crate::schema::{FieldKind, Row, SelectOption, TableSchema};
use crate::session::SessionContext;
use crate::Error;

/// Escape text for safe interpolation into HTML
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const STYLE: &str = r#"
        body { font-family: system-ui, -apple-system, sans-serif; margin: 0; background: #f3f4f6; color: #111827; }
        .shell { display: flex; min-height: 100vh; }
        nav { width: 220px; background: #111827; color: #e5e7eb; padding: 16px 0; }
        nav h1 { font-size: 1.1em; padding: 0 16px 12px; margin: 0; border-bottom: 1px solid #374151; }
        nav a { display: block; padding: 8px 16px; color: #e5e7eb; text-decoration: none; }
        nav a:hover { background: #1f2937; }
        nav form { padding: 12px 16px; }
        main { flex: 1; padding: 24px; }
        .topline { display: flex; justify-content: space-between; align-items: center; }
        .banner { background: #fef2f2; border: 1px solid #fecaca; color: #991b1b; padding: 12px 16px; border-radius: 6px; margin: 12px 0; }
        table { width: 100%; border-collapse: collapse; background: white; border-radius: 6px; overflow: hidden; }
        th, td { padding: 8px 12px; text-align: left; border-bottom: 1px solid #e5e7eb; font-size: 0.9em; }
        th { background: #f9fafb; text-transform: uppercase; font-size: 0.75em; color: #6b7280; }
        .actions { white-space: nowrap; }
        .actions form { display: inline; }
        .button, button { background: #2563eb; color: white; border: none; padding: 6px 12px; border-radius: 4px; cursor: pointer; text-decoration: none; font-size: 0.9em; }
        .button.danger, button.danger { background: #dc2626; }
        .field { margin-bottom: 14px; }
        .field label { display: block; margin-bottom: 4px; font-weight: 500; }
        .field input[type=text], .field input[type=email], .field input[type=number],
        .field input[type=date], .field input[type=datetime-local], .field input[type=password],
        .field textarea, .field select { width: 100%; max-width: 480px; padding: 8px; border: 1px solid #d1d5db; border-radius: 4px; }
        .field .error { color: #dc2626; font-size: 0.85em; margin-top: 4px; }
        .required { color: #dc2626; }
        details pre { background: #f9fafb; padding: 8px; border-radius: 4px; max-height: 160px; overflow: auto; font-size: 0.85em; }
        dl dt { font-weight: 600; margin-top: 10px; }
        dl dd { margin: 2px 0 0 0; color: #374151; }
"#;

/// Shared page chrome: side navigation plus the page body
fn layout(
    base: &str,
    navigation: &[(String, String)],
    session: Option<&SessionContext>,
    title: &str,
    body: &str,
) -> String {
    let mut nav_links = String::new();
    for (key, display_name) in navigation {
        nav_links.push_str(&format!(
            "<a href=\"{}/t/{}\">{}</a>\n",
            base,
            escape_html(key),
            escape_html(display_name)
        ));
    }

    let account = match session {
        Some(session) => format!(
            "<form method=\"post\" action=\"{}/logout\">\
             <div style=\"font-size:0.8em;margin-bottom:6px\">{}</div>\
             <button type=\"submit\">Uitloggen</button></form>",
            base,
            escape_html(&session.email)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="nl">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body>
    <div class="shell">
        <nav>
            <h1>CRM Admin</h1>
            {nav_links}
            {account}
        </nav>
        <main>
            {body}
        </main>
    </div>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        nav_links = nav_links,
        account = account,
        body = body,
    )
}

/// Login page, standalone (no navigation)
pub fn login_page(base: &str, error: Option<&str>) -> String {
    let banner = match error {
        Some(message) => format!("<div class=\"banner\">{}</div>", escape_html(message)),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="nl">
<head>
    <meta charset="UTF-8">
    <title>Inloggen - CRM Admin</title>
    <style>{style}</style>
</head>
<body>
    <main style="max-width:360px;margin:80px auto">
        <h2>Inloggen</h2>
        {banner}
        <form method="post" action="{base}/login">
            <div class="field">
                <label>Email</label>
                <input type="email" name="email" required>
            </div>
            <div class="field">
                <label>Wachtwoord</label>
                <input type="password" name="password" required>
            </div>
            <button type="submit">Inloggen</button>
        </form>
    </main>
</body>
</html>
"#,
        style = STYLE,
        banner = banner,
        base = base,
    )
}

fn render_cell(cell: &CellView) -> String {
    match cell {
        CellView::Text { text } => escape_html(text),
        CellView::Json { keys, pretty } => format!(
            "<details><summary>JSON Data ({} keys)</summary><pre>{}</pre></details>",
            keys,
            escape_html(pretty)
        ),
    }
}

/// Row listing with the add button, per-row actions and an optional error
/// banner
fn list_body(base: &str, table_key: &str, table: &TableView, banner: Option<&str>) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<div class=\"topline\"><h2>{}</h2>\
         <a class=\"button\" href=\"{}/t/{}/new\">+ Toevoegen</a></div>\n",
        escape_html(&table.title),
        base,
        table_key
    ));

    if let Some(message) = banner {
        body.push_str(&format!(
            "<div class=\"banner\">{}</div>\n",
            escape_html(message)
        ));
    }

    body.push_str("<table>\n<thead><tr>");
    for column in &table.columns {
        body.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    body.push_str("<th>Acties</th></tr></thead>\n<tbody>\n");

    if table.rows.is_empty() {
        body.push_str(&format!(
            "<tr><td colspan=\"{}\">Geen data beschikbaar</td></tr>\n",
            table.columns.len() + 1
        ));
    }

    for row in &table.rows {
        body.push_str("<tr>");
        for cell in &row.cells {
            body.push_str(&format!("<td>{}</td>", render_cell(cell)));
        }
        match &row.id {
            Some(id) => body.push_str(&format!(
                "<td class=\"actions\">\
                 <a href=\"{base}/t/{key}/{id}\">Bekijken</a> \
                 <a href=\"{base}/t/{key}/{id}/edit\">Bewerken</a> \
                 <form method=\"post\" action=\"{base}/t/{key}/{id}/delete\" \
                 onsubmit=\"return confirm('Weet je zeker dat je dit item wilt verwijderen?')\">\
                 <button type=\"submit\" class=\"danger\">Verwijderen</button></form></td>",
                base = base,
                key = table_key,
                id = escape_html(id)
            )),
            None => body.push_str("<td></td>"),
        }
        body.push_str("</tr>\n");
    }

    body.push_str("</tbody>\n</table>\n");
    body
}

fn render_widget(field: &crate::render::form::FormFieldView) -> String {
    let name = escape_html(&field.name);
    let value = escape_html(&field.value);

    match &field.kind {
        FieldKind::Textarea => format!(
            "<textarea name=\"{}\" rows=\"3\">{}</textarea>",
            name, value
        ),

        FieldKind::Boolean => format!(
            "<input type=\"checkbox\" name=\"{}\"{}>",
            name,
            if field.checked { " checked" } else { "" }
        ),

        FieldKind::Enum { .. } | FieldKind::Relation(_) => {
            let mut select = format!(
                "<select name=\"{}\"><option value=\"\">Selecteer {}</option>",
                name,
                escape_html(&field.label)
            );
            for option in &field.options {
                let option_value = crate::render::list::display_text(&option.value);
                let selected = if option_value == field.value {
                    " selected"
                } else {
                    ""
                };
                select.push_str(&format!(
                    "<option value=\"{}\"{}>{}</option>",
                    escape_html(&option_value),
                    selected,
                    escape_html(&option.label)
                ));
            }
            select.push_str("</select>");
            select
        }

        FieldKind::Date => format!(
            "<input type=\"date\" name=\"{}\" value=\"{}\">",
            name, value
        ),

        FieldKind::DateTime | FieldKind::Timestamp => format!(
            "<input type=\"datetime-local\" name=\"{}\" value=\"{}\">",
            name, value
        ),

        FieldKind::Number => format!(
            "<input type=\"number\" step=\"any\" name=\"{}\" value=\"{}\">",
            name, value
        ),

        FieldKind::Email => format!(
            "<input type=\"email\" name=\"{}\" value=\"{}\">",
            name, value
        ),

        FieldKind::Text | FieldKind::Uuid => format!(
            "<input type=\"text\" name=\"{}\" value=\"{}\">",
            name, value
        ),
    }
}

/// Create/edit form body
fn form_body(base: &str, table_key: &str, form: &FormView, action: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h2>{}</h2>\n", escape_html(&form.title)));

    if let Some(message) = &form.banner {
        body.push_str(&format!(
            "<div class=\"banner\">{}</div>\n",
            escape_html(message)
        ));
    }

    body.push_str(&format!("<form method=\"post\" action=\"{}\">\n", action));
    for field in &form.fields {
        let required_mark = if field.required {
            " <span class=\"required\">*</span>"
        } else {
            ""
        };
        let error = match &field.error {
            Some(message) => format!("<div class=\"error\">{}</div>", escape_html(message)),
            None => String::new(),
        };
        body.push_str(&format!(
            "<div class=\"field\"><label>{}{}</label>{}{}</div>\n",
            escape_html(&field.label),
            required_mark,
            render_widget(field),
            error
        ));
    }
    body.push_str(&format!(
        "<button type=\"submit\">Opslaan</button> \
         <a class=\"button\" style=\"background:#6b7280\" href=\"{}/t/{}\">Annuleren</a>\n</form>\n",
        base, table_key
    ));
    body
}

/// Read-only row projection with the edit and delete transitions
fn view_body(base: &str, table_key: &str, id: &str, form: &FormView) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h2>{}</h2>\n<dl>\n", escape_html(&form.title)));
    for field in &form.fields {
        body.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>\n",
            escape_html(&field.label),
            escape_html(&field.value)
        ));
    }
    body.push_str("</dl>\n");
    body.push_str(&format!(
        "<p><a class=\"button\" href=\"{base}/t/{key}/{id}/edit\">Bewerken</a> \
         <form method=\"post\" action=\"{base}/t/{key}/{id}/delete\" style=\"display:inline\" \
         onsubmit=\"return confirm('Weet je zeker dat je dit item wilt verwijderen?')\">\
         <button type=\"submit\" class=\"danger\">Verwijderen</button></form></p>\n",
        base = base,
        key = table_key,
        id = escape_html(id)
    ));
    body
}

fn navigation<G: CrudGateway>(state: &AdminState<G>) -> Vec<(String, String)> {
    state
        .registry
        .iter()
        .map(|schema| (schema.table_name.clone(), schema.display_name.clone()))
        .collect()
}

fn error_response<G: CrudGateway>(
    state: &AdminState<G>,
    session: Option<&SessionContext>,
    status: StatusCode,
    message: &str,
) -> Response {
    let body = format!("<div class=\"banner\">{}</div>", escape_html(message));
    let page = layout(
        &state.base_path,
        &navigation(state),
        session,
        "Fout - CRM Admin",
        &body,
    );
    (status, Html(page)).into_response()
}

fn form_values_to_row(values: HashMap<String, String>) -> Row {
    values
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect()
}

fn render_list_page<G: CrudGateway>(
    state: &AdminState<G>,
    session: Option<&SessionContext>,
    schema: &TableSchema,
    rows: &[Row],
    related: &HashMap<String, Vec<SelectOption>>,
    banner: Option<&str>,
) -> Response {
    let table = build_table(schema, rows, related);
    let body = list_body(&state.base_path, &schema.table_name, &table, banner);
    let page = layout(
        &state.base_path,
        &navigation(state),
        session,
        &format!("{} - CRM Admin", schema.display_name),
        &body,
    );
    Html(page).into_response()
}

fn render_form_page<G: CrudGateway>(
    state: &AdminState<G>,
    session: Option<&SessionContext>,
    schema: &TableSchema,
    form: &FormView,
    action: &str,
    status: StatusCode,
) -> Response {
    let body = form_body(&state.base_path, &schema.table_name, form, action);
    let page = layout(
        &state.base_path,
        &navigation(state),
        session,
        &format!("{} - CRM Admin", form.title),
        &body,
    );
    (status, Html(page)).into_response()
}

/// Handler for GET {base}/ that lands on the first registered table
pub async fn home_handler<G: CrudGateway>(State(state): State<AdminState<G>>) -> Response {
    match state.registry.iter().next() {
        Some(schema) => Redirect::to(&format!(
            "{}/t/{}",
            state.base_path, schema.table_name
        ))
        .into_response(),
        None => error_response(
            &state,
            None,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Geen tabellen geregistreerd",
        ),
    }
}

/// Handler for GET {base}/t/{key}, the row listing
pub async fn list_page_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path(key): Path<String>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let (rows, related) = tokio::join!(
        state.gateway.fetch_all(&schema.table_name),
        load_related_options(&state.gateway, schema)
    );

    match rows {
        Ok(rows) => render_list_page(&state, session, schema, &rows, &related, None),
        Err(error) => {
            tracing::error!(table = %schema.table_name, %error, "failed to load rows");
            render_list_page(
                &state,
                session,
                schema,
                &[],
                &related,
                Some(&format!("Fout bij laden van data: {}", error)),
            )
        }
    }
}

/// Handler for GET {base}/t/{key}/new, the empty create form
pub async fn new_form_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path(key): Path<String>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let related = load_related_options(&state.gateway, schema).await;
    let form = build_form(schema, FormMode::Create, None, &related);
    let action = format!("{}/t/{}", state.base_path, schema.table_name);
    render_form_page(&state, session, schema, &form, &action, StatusCode::OK)
}

async fn find_row<G: CrudGateway>(
    state: &AdminState<G>,
    schema: &TableSchema,
    id: &str,
) -> Result<Row, Error> {
    let rows = state.gateway.fetch_all(&schema.table_name).await?;
    rows.into_iter()
        .find(|row| {
            row.get("id")
                .map(crate::render::list::display_text)
                .as_deref()
                == Some(id)
        })
        .ok_or_else(|| Error::Persistence(format!("Rij {} niet gevonden", id)))
}

/// Handler for GET {base}/t/{key}/{id}, the read-only row view
pub async fn view_page_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path((key, id)): Path<(String, String)>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let (row, related) = tokio::join!(
        find_row(&state, schema, &id),
        load_related_options(&state.gateway, schema)
    );

    let row = match row {
        Ok(row) => row,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let form = build_form(schema, FormMode::View, Some(&row), &related);
    let body = view_body(&state.base_path, &schema.table_name, &id, &form);
    let page = layout(
        &state.base_path,
        &navigation(&state),
        session,
        &format!("{} - CRM Admin", form.title),
        &body,
    );
    Html(page).into_response()
}

/// Handler for GET {base}/t/{key}/{id}/edit, the pre-filled edit form
pub async fn edit_form_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path((key, id)): Path<(String, String)>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let (row, related) = tokio::join!(
        find_row(&state, schema, &id),
        load_related_options(&state.gateway, schema)
    );

    let row = match row {
        Ok(row) => row,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let form = build_form(schema, FormMode::Edit, Some(&row), &related);
    let action = format!("{}/t/{}/{}", state.base_path, schema.table_name, id);
    render_form_page(&state, session, schema, &form, &action, StatusCode::OK)
}

async fn handle_submission<G: CrudGateway>(
    state: &AdminState<G>,
    session: Option<&SessionContext>,
    schema: &TableSchema,
    action: SubmitAction,
    raw: Row,
    form_mode: FormMode,
    form_action: String,
) -> Response {
    match submit_and_refresh(state.gateway.as_ref(), schema, &action, &raw).await {
        Ok(rows) => {
            let related = load_related_options(&state.gateway, schema).await;
            render_list_page(state, session, schema, &rows, &related, None)
        }
        Err(Error::Validation(errors)) => {
            // Keep the form open with the submitted values and the
            // per-field messages attached
            let related = load_related_options(&state.gateway, schema).await;
            let form =
                build_form(schema, form_mode, Some(&raw), &related).apply_errors(&errors);
            render_form_page(
                state,
                session,
                schema,
                &form,
                &form_action,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
        Err(error) => {
            tracing::error!(table = %schema.table_name, %error, "submission failed");
            let related = load_related_options(&state.gateway, schema).await;
            let form = build_form(schema, form_mode, Some(&raw), &related)
                .with_banner(format!("Fout bij opslaan van data: {}", error));
            render_form_page(
                state,
                session,
                schema,
                &form,
                &form_action,
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// Handler for POST {base}/t/{key}, the create submission
pub async fn create_submit_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path(key): Path<String>,
    Form(values): Form<HashMap<String, String>>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema.clone(),
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let action = format!("{}/t/{}", state.base_path, schema.table_name);
    handle_submission(
        &state,
        session,
        &schema,
        SubmitAction::Create,
        form_values_to_row(values),
        FormMode::Create,
        action,
    )
    .await
}

/// Handler for POST {base}/t/{key}/{id}, the edit submission
pub async fn update_submit_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path((key, id)): Path<(String, String)>,
    Form(values): Form<HashMap<String, String>>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema.clone(),
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    let action = format!("{}/t/{}/{}", state.base_path, schema.table_name, id);
    handle_submission(
        &state,
        session,
        &schema,
        SubmitAction::Update(RowId::parse(&id)),
        form_values_to_row(values),
        FormMode::Edit,
        action,
    )
    .await
}

/// Handler for POST {base}/t/{key}/{id}/delete, the confirmed delete
pub async fn delete_submit_handler<G: CrudGateway>(
    State(state): State<AdminState<G>>,
    session: Option<Extension<SessionContext>>,
    Path((key, id)): Path<(String, String)>,
) -> Response {
    let session = session.as_deref();
    let schema = match state.registry.lookup(&key) {
        Ok(schema) => schema,
        Err(error) => {
            return error_response(&state, session, StatusCode::NOT_FOUND, &error.to_string())
        }
    };

    match delete_and_refresh(state.gateway.as_ref(), schema, &RowId::parse(&id)).await {
        Ok(rows) => {
            let related = load_related_options(&state.gateway, schema).await;
            render_list_page(&state, session, schema, &rows, &related, None)
        }
        Err(error) => {
            tracing::error!(table = %schema.table_name, %error, "delete failed");
            let rows = state
                .gateway
                .fetch_all(&schema.table_name)
                .await
                .unwrap_or_default();
            let related = load_related_options(&state.gateway, schema).await;
            render_list_page(
                &state,
                session,
                schema,
                &rows,
                &related,
                Some(&format!("Fout bij verwijderen van data: {}", error)),
            )
        }
    }
}
