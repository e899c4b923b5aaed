//! School 视图：列表、详情、创建、更新、删除，以及首页和探活视图
//!
//! 每个处理函数只做一次请求-响应，状态都在 [`AppState`] 里。

use super::forms::SchoolForm;
use super::models::{School, SchoolField};
use crate::error::{AppError, AppResult};
use crate::render::{base_context, extend_context};
use crate::response::{redirect_found, respond_text};
use crate::state::AppState;
use actix_web::{http::StatusCode, web, HttpResponse};
use std::collections::HashMap;
use tera::Context;
use tracing::{info, instrument};

pub const INDEX_TEMPLATE: &str = "index.html";
pub const LIST_TEMPLATE: &str = "basic_app/school_list.html";
pub const DETAIL_TEMPLATE: &str = "basic_app/school_detail.html";
pub const FORM_TEMPLATE: &str = "basic_app/school_form.html";
pub const CONFIRM_DELETE_TEMPLATE: &str = "basic_app/school_confirm_delete.html";

/// 首页注入的标记值
pub const INJECTED_MARKER: &str = "BASIC_INJECTION";

/// 探活视图的固定响应
pub const PROBE_BODY: &str = "CLASS BUILD VIEWS IS COOL!!!";

type FormData = web::Form<HashMap<String, String>>;

/// 探活：确认路由能到达自定义视图
pub async fn probe() -> HttpResponse {
    respond_text(StatusCode::OK, PROBE_BODY)
}

/// 首页：基础上下文 + `injectme`
pub async fn index(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let mut extra = Context::new();
    extra.insert("injectme", INJECTED_MARKER);
    let context = extend_context(base_context("index"), extra);
    state.templates.render_response(INDEX_TEMPLATE, &context)
}

/// 列表：全部记录，存储层默认顺序
pub async fn school_list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let schools = state.store.fetch_all().await?;

    let mut extra = Context::new();
    extra.insert("schools", &schools);
    extra.insert("object_list", &schools);
    let context = extend_context(base_context("school_list"), extra);
    state.templates.render_response(LIST_TEMPLATE, &context)
}

/// 详情
pub async fn school_detail(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let school = get_school_or_404(&state, path.into_inner()).await?;

    let mut extra = object_context(&school);
    extra.insert("school_detail", &school);
    let context = extend_context(base_context("school_detail"), extra);
    state.templates.render_response(DETAIL_TEMPLATE, &context)
}

/// 创建页（空表单）
pub async fn school_create_form(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let form = SchoolForm::unbound(&SchoolField::ALL);
    render_form(&state, "school_create", &form, None)
}

/// 提交创建
#[instrument(skip_all)]
pub async fn school_create(state: web::Data<AppState>, data: FormData) -> AppResult<HttpResponse> {
    let form = SchoolForm::bind(&SchoolField::ALL, &data);
    let Some(new_school) = form.to_new_school() else {
        return render_form(&state, "school_create", &form, None);
    };

    let school = state.store.insert(new_school).await?;
    info!(id = school.id, name = %school.name, "School 已创建");

    let location = success_url(&state, state.settings.create_success_url.as_deref(), &school)?;
    Ok(redirect_found(location))
}

/// 更新页（以当前值填充允许修改的字段）
pub async fn school_update_form(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let fields = update_fields(&state)?;
    let school = get_school_or_404(&state, path.into_inner()).await?;

    let form = SchoolForm::for_instance(&fields, &school);
    render_form(&state, "school_update", &form, Some(&school))
}

/// 提交更新：只应用白名单内的字段，其它提交的字段被忽略
#[instrument(skip_all)]
pub async fn school_update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    data: FormData,
) -> AppResult<HttpResponse> {
    let fields = update_fields(&state)?;
    let school = get_school_or_404(&state, path.into_inner()).await?;

    let form = SchoolForm::bind(&fields, &data);
    let Some(changes) = form.to_changes() else {
        return render_form(&state, "school_update", &form, Some(&school));
    };

    let school = state
        .store
        .update(school.id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("school"))?;
    info!(id = school.id, fields = ?fields, "School 已更新");

    let location = success_url(&state, state.settings.update_success_url.as_deref(), &school)?;
    Ok(redirect_found(location))
}

/// 删除确认页，不修改数据
pub async fn school_delete_confirm(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let school = get_school_or_404(&state, path.into_inner()).await?;

    let context = extend_context(base_context("school_delete"), object_context(&school));
    state.templates.render_response(CONFIRM_DELETE_TEMPLATE, &context)
}

/// 确认删除后跳转到列表
#[instrument(skip_all)]
pub async fn school_delete(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !state.store.delete(id).await? {
        return Err(AppError::not_found("school"));
    }
    info!(id, "School 已删除");

    let location = state.routes.reverse::<&str, &str>("basic_app:list", &[])?;
    Ok(redirect_found(location))
}

async fn get_school_or_404(state: &AppState, id: i64) -> AppResult<School> {
    state
        .store
        .fetch_one(id)
        .await?
        .ok_or_else(|| AppError::not_found("school"))
}

/// 单条记录的通用上下文：`object` 和 `school`
fn object_context(school: &School) -> Context {
    let mut context = Context::new();
    context.insert("object", school);
    context.insert("school", school);
    context
}

fn render_form(
    state: &AppState,
    view: &str,
    form: &SchoolForm,
    school: Option<&School>,
) -> AppResult<HttpResponse> {
    let mut extra = school.map(object_context).unwrap_or_default();
    extra.insert("form", &form.context());
    let context = extend_context(base_context(view), extra);
    state.templates.render_response(FORM_TEMPLATE, &context)
}

/// 每次请求都重新按 School 字段校验白名单
fn update_fields(state: &AppState) -> AppResult<Vec<SchoolField>> {
    SchoolField::parse_allow_list(&state.settings.update_fields)
}

/// 有配置时用配置（替换 `{pk}`），否则跳到记录详情
fn success_url(state: &AppState, configured: Option<&str>, school: &School) -> AppResult<String> {
    let pk = school.id.to_string();
    match configured {
        Some(template) => Ok(template.replace("{pk}", &pk)),
        None => state.routes.reverse("basic_app:detail", &[("pk", pk.as_str())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::basic_app::store::{MemorySchoolStore, SchoolRepository, SqlSchoolStore};
    use crate::state::ViewSettings;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::header;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn state_with(store: Arc<dyn SchoolRepository>, settings: ViewSettings) -> web::Data<AppState> {
        web::Data::new(AppState::new(store, None, settings).unwrap())
    }

    fn memory_state() -> web::Data<AppState> {
        state_with(Arc::new(MemorySchoolStore::new()), ViewSettings::default())
    }

    macro_rules! app {
        ($state:expr) => {{
            let state = $state;
            let routes = state.routes.clone();
            test::init_service(
                App::new()
                    .app_data(state)
                    .configure(move |cfg| routes.configure_all_routes(cfg)),
            )
            .await
        }};
    }

    fn location(resp: &ServiceResponse) -> String {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn body_of(resp: ServiceResponse) -> String {
        let bytes = test::read_body(resp).await;
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn lincoln_form() -> [(&'static str, &'static str); 3] {
        [
            ("name", "Lincoln High"),
            ("principal", "J. Smith"),
            ("location", "Springfield"),
        ]
    }

    #[actix_web::test]
    async fn test_probe() {
        let app = app!(memory_state());
        let req = test::TestRequest::get().uri("/cbv/").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_of(resp).await, "CLASS BUILD VIEWS IS COOL!!!");
    }

    #[actix_web::test]
    async fn test_index_injects_marker() {
        let app = app!(memory_state());
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_of(resp).await.contains("BASIC_INJECTION"));
    }

    #[actix_web::test]
    async fn test_create_detail_update_delete_scenario() {
        let state = memory_state();
        let store = state.store.clone();
        let app = app!(state);

        // 创建
        let req = test::TestRequest::post()
            .uri("/basic_app/create/")
            .set_form(lincoln_form())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        let created = store.fetch_all().await.unwrap().pop().unwrap();
        assert_eq!(location(&resp), format!("/basic_app/{}/", created.id));

        // 详情
        let req = test::TestRequest::get()
            .uri(&format!("/basic_app/{}/", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;
        assert!(body.contains("Name: Lincoln High"));
        assert!(body.contains("Principal: J. Smith"));
        assert!(body.contains("Location: Springfield"));

        // 更新：location 不在白名单内，提交了也不生效
        let req = test::TestRequest::post()
            .uri(&format!("/basic_app/update/{}/", created.id))
            .set_form([
                ("name", "Lincoln HS"),
                ("principal", "J. Smith"),
                ("location", "Shelbyville"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/basic_app/{}/", created.id));

        let updated = store.fetch_one(created.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Lincoln HS");
        assert_eq!(updated.principal, "J. Smith");
        assert_eq!(updated.location, "Springfield");

        // 删除确认页不修改数据
        let req = test::TestRequest::get()
            .uri(&format!("/basic_app/delete/{}/", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_of(resp).await.contains("Are you sure you want to delete Lincoln HS?"));
        assert!(store.fetch_one(created.id).await.unwrap().is_some());

        // 确认删除
        let req = test::TestRequest::post()
            .uri(&format!("/basic_app/delete/{}/", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/basic_app/");

        let req = test::TestRequest::get()
            .uri(&format!("/basic_app/{}/", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/basic_app/").to_request();
        let body = body_of(test::call_service(&app, req).await).await;
        assert!(!body.contains("Lincoln"));
        assert!(body.contains("No schools yet."));
    }

    #[actix_web::test]
    async fn test_list_counts_live_records() {
        let state = memory_state();
        let store = state.store.clone();
        let app = app!(state);

        for name in ["Alpha", "Beta", "Gamma"] {
            let req = test::TestRequest::post()
                .uri("/basic_app/create/")
                .set_form([("name", name), ("principal", "P"), ("location", "L")])
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
        }
        let beta = store.fetch_all().await.unwrap()[1].clone();
        let req = test::TestRequest::post()
            .uri(&format!("/basic_app/delete/{}/", beta.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

        let req = test::TestRequest::get().uri("/basic_app/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;

        assert_eq!(body.matches("<li><a href=").count(), 2);
        assert!(body.contains("Alpha"));
        assert!(!body.contains("Beta"));
        assert!(body.contains("Gamma"));
        assert!(body.find("Alpha").unwrap() < body.find("Gamma").unwrap());
    }

    #[actix_web::test]
    async fn test_invalid_create_rerenders_without_persisting() {
        let state = memory_state();
        let store = state.store.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/basic_app/create/")
            .set_form([("name", "Lincoln High"), ("principal", " "), ("location", "")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;
        assert!(body.contains("This field is required."));
        assert!(body.contains("value=\"Lincoln High\""));
        assert!(store.fetch_all().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_create_form_get() {
        let app = app!(memory_state());
        let req = test::TestRequest::get().uri("/basic_app/create/").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_of(resp).await;
        for field in ["name", "principal", "location"] {
            assert!(body.contains(&format!("name=\"{}\"", field)));
        }
    }

    #[actix_web::test]
    async fn test_update_form_prefills_allowed_fields() {
        let state = memory_state();
        let school = state
            .store
            .insert(crate::modules::basic_app::models::NewSchool {
                name: "Lincoln High".to_string(),
                principal: "J. Smith".to_string(),
                location: "Springfield".to_string(),
            })
            .await
            .unwrap();
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/basic_app/update/{}/", school.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_of(resp).await;
        assert!(body.contains("value=\"Lincoln High\""));
        assert!(body.contains("value=\"J. Smith\""));
        assert!(!body.contains("name=\"location\""));
    }

    #[actix_web::test]
    async fn test_invalid_update_keeps_record() {
        let state = memory_state();
        let school = state
            .store
            .insert(crate::modules::basic_app::models::NewSchool {
                name: "Lincoln High".to_string(),
                principal: "J. Smith".to_string(),
                location: "Springfield".to_string(),
            })
            .await
            .unwrap();
        let store = state.store.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/basic_app/update/{}/", school.id))
            .set_form([("name", "")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_of(resp).await.contains("This field is required."));
        assert_eq!(store.fetch_one(school.id).await.unwrap(), Some(school));
    }

    #[actix_web::test]
    async fn test_unknown_ids_are_404() {
        let app = app!(memory_state());

        for (method, uri) in [
            ("GET", "/basic_app/42/"),
            ("GET", "/basic_app/update/42/"),
            ("POST", "/basic_app/update/42/"),
            ("GET", "/basic_app/delete/42/"),
            ("POST", "/basic_app/delete/42/"),
        ] {
            let req = match method {
                "GET" => test::TestRequest::get().uri(uri),
                _ => test::TestRequest::post()
                    .uri(uri)
                    .set_form([("name", "X"), ("principal", "Y")]),
            }
            .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
        }
    }

    #[actix_web::test]
    async fn test_configured_success_urls() {
        let settings = ViewSettings {
            update_fields: vec!["name".into(), "principal".into(), "location".into()],
            create_success_url: Some("/basic_app/".to_string()),
            update_success_url: Some("/basic_app/{pk}/?updated=1".to_string()),
        };
        let state = state_with(Arc::new(MemorySchoolStore::new()), settings);
        let store = state.store.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/basic_app/create/")
            .set_form(lincoln_form())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "/basic_app/");

        let school = store.fetch_all().await.unwrap().pop().unwrap();
        let req = test::TestRequest::post()
            .uri(&format!("/basic_app/update/{}/", school.id))
            .set_form([
                ("name", "Lincoln HS"),
                ("principal", "J. Smith"),
                ("location", "Shelbyville"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), format!("/basic_app/{}/?updated=1", school.id));

        // location 在白名单内时可以修改
        let updated = store.fetch_one(school.id).await.unwrap().unwrap();
        assert_eq!(updated.location, "Shelbyville");
    }

    #[actix_web::test]
    async fn test_bad_allow_list_is_server_error() {
        let settings = ViewSettings {
            update_fields: vec!["name".into(), "id".into()],
            ..Default::default()
        };
        let state = state_with(Arc::new(MemorySchoolStore::new()), settings);
        let school = state
            .store
            .insert(crate::modules::basic_app::models::NewSchool {
                name: "Lincoln High".to_string(),
                principal: "J. Smith".to_string(),
                location: "Springfield".to_string(),
            })
            .await
            .unwrap();
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/basic_app/update/{}/", school.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_scenario_against_sqlite() {
        let store = SqlSchoolStore::connect("sqlite::memory:", 1).await.unwrap();
        store.migrate().await.unwrap();
        let state = state_with(Arc::new(store), ViewSettings::default());
        let store = state.store.clone();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/basic_app/create/")
            .set_form(lincoln_form())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let school = store.fetch_all().await.unwrap().pop().unwrap();
        let req = test::TestRequest::post()
            .uri(&format!("/basic_app/update/{}/", school.id))
            .set_form([("name", "Lincoln HS"), ("principal", "J. Smith")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

        let req = test::TestRequest::get()
            .uri(&format!("/basic_app/{}/", school.id))
            .to_request();
        let body = body_of(test::call_service(&app, req).await).await;
        assert!(body.contains("Name: Lincoln HS"));
        assert!(body.contains("Principal: J. Smith"));
        assert!(body.contains("Location: Springfield"));
    }
}
