use actix_web::{
    cookie::{Cookie, SameSite},
    get, post, web, HttpResponse,
};
use log::{debug, info, warn};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    auth::{self, Session, TOKEN_COOKIE},
    config::Config,
    error::ApiError,
    model::{Message, NewUser, PublicUser, UserDetail, UserId},
    photos,
    store::{self, Db},
    util, validation,
};

const DUPLICATE_LOGIN: &str = "The login name already exists, please choose a different login name";

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .path("/")
        .secure(true)
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish()
}

#[derive(Deserialize, Debug)]
struct LoginForm {
    #[serde(default)]
    login_name: String,
    #[serde(default)]
    password: String,
}

#[post("/admin/login")]
async fn login(form: web::Json<LoginForm>, sql: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    let user = match store::find_user_by_login(&**sql, &form.login_name).await? {
        Some(x) if auth::verify_password(&form.password, &x.password).is_ok() => x,
        _ => {
            debug!("login failed for {:?}", form.login_name);
            return Err(ApiError::bad_request("Invalid login name or password"));
        }
    };

    let token = util::generate_token();

    store::create_session(
        &**sql,
        user.id,
        &token,
        OffsetDateTime::now_utc().unix_timestamp(),
    )
    .await?;

    info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token))
        .json(PublicUser::from(&user)))
}

#[post("/admin/logout")]
async fn logout(
    session: Result<Session, ApiError>,
    sql: web::Data<Db>,
) -> Result<HttpResponse, ApiError> {
    let session = match session {
        Ok(x) => x,
        Err(ApiError::Unauthorized) => {
            return Err(ApiError::bad_request("No user currently logged in"))
        }
        Err(x) => return Err(x),
    };

    store::delete_session(&**sql, &session.token).await?;

    info!("user {} logged out", session.user.id);

    let mut removal = session_cookie(String::new());
    removal.make_removal();

    Ok(HttpResponse::Ok()
        .cookie(removal)
        .json(Message::new("Logged out")))
}

#[post("/user")]
async fn register(form: web::Json<NewUser>, sql: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    let user = form.into_inner();

    validation::registration(&user).map_err(ApiError::bad_request)?;

    if store::find_user_by_login(&**sql, &user.login_name)
        .await?
        .is_some()
    {
        debug!("login name {:?} already taken", user.login_name);
        return Err(ApiError::bad_request(DUPLICATE_LOGIN));
    }

    let hash = auth::hash_password(&user.password).map_err(|x| ApiError::Internal(x.to_string()))?;

    match store::insert_user(&**sql, &user, &hash).await {
        Ok(id) => {
            info!("created user {id} ({})", user.login_name);
            Ok(HttpResponse::Ok().json(Message::new("User created successfully!")))
        }
        // lost a race against another registration with the same name
        Err(x) if store::is_unique_violation(&x) => Err(ApiError::bad_request(DUPLICATE_LOGIN)),
        Err(x) => Err(x.into()),
    }
}

#[get("/user/list")]
async fn list(sql: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store::list_users(&**sql).await?))
}

#[get("/user/{id}")]
async fn detail(sql: web::Data<Db>, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let id = UserId(id.into_inner());

    match store::find_user(&**sql, id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(UserDetail::from(user))),
        None => {
            debug!("user {id} not found");
            Err(ApiError::not_found(format!("User {id} not found")))
        }
    }
}

#[post("/deleteUser/{id}")]
async fn delete_user(
    sql: web::Data<Db>,
    config: web::Data<Config>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = UserId(id.into_inner());

    let files = store::delete_user(&**sql, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {id} not found")))?;

    info!("deleted user {id} and {} photos", files.len());

    if let Err(x) = photos::discard_files(&config.upload_dir, &files).await {
        warn!("user {id} deleted but some image files remain: {x:?}");
    }

    Ok(HttpResponse::Ok().json(Message::new("User deleted")))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(logout)
        .service(register)
        .service(list)
        .service(detail)
        .service(delete_user);
}
