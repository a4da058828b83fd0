use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{get, http::header, post, web, HttpResponse};
use futures_util::TryStreamExt as _;
use log::{debug, error, info, warn};
use mime::Mime;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    aggregate::{self, PhotoView},
    auth::Session,
    config::Config,
    error::ApiError,
    model::{CommentId, Message, PhotoId, UserId},
    store::{self, CommentRemoval, Db, LikeState},
    util, validation,
};

#[get("/photosOfUser/{id}")]
async fn photos_of_user(sql: web::Data<Db>, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let id = UserId(id.into_inner());

    let photos = match store::photos_of_user(&**sql, id).await {
        Ok(x) => x,
        Err(x) => {
            error!("fetching photos of user {id}: {x:?}");
            return Err(ApiError::bad_request(format!(
                "Photos for user with id {id}: Not Found"
            )));
        }
    };

    if photos.is_empty() {
        debug!("user {id} has no photos");
        return Ok(HttpResponse::Ok().json(Option::<Vec<PhotoView>>::None));
    }

    let view = aggregate::annotate(photos, |user| store::find_public_user(&**sql, user)).await?;

    debug!("serving {} photos of user {id}", view.len());

    Ok(HttpResponse::Ok().json(view))
}

#[derive(Deserialize)]
struct LikeForm {
    user_id: Option<UserId>,
}

#[post("/likePhoto/{photo_id}")]
async fn like(
    sql: web::Data<Db>,
    photo_id: web::Path<i64>,
    form: web::Json<LikeForm>,
) -> Result<HttpResponse, ApiError> {
    let photo = PhotoId(photo_id.into_inner());
    let user = form
        .user_id
        .ok_or_else(|| ApiError::bad_request("user_id is required"))?;

    let message = match store::toggle_like(&**sql, photo, user).await? {
        Some(LikeState::Liked) => "Photo liked",
        Some(LikeState::Unliked) => "Photo unliked",
        None => return Err(ApiError::not_found("Photo not found")),
    };

    debug!("user {user} on photo {photo}: {message}");

    Ok(HttpResponse::Ok().json(Message::new(message)))
}

#[derive(Deserialize)]
struct CommentForm {
    comment: Option<String>,
}

#[post("/commentsOfPhoto/{photo_id}")]
async fn add_comment(
    sql: web::Data<Db>,
    session: Session,
    photo_id: web::Path<i64>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let photo = PhotoId(photo_id.into_inner());

    let text = validation::comment(form.comment.as_deref()).map_err(ApiError::bad_request)?;

    let photo = store::add_comment(
        &**sql,
        photo,
        session.user.id,
        text,
        OffsetDateTime::now_utc(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Photo not found"))?;

    debug!("user {} commented on photo {}", session.user.id, photo.id);

    Ok(HttpResponse::Ok().json(photo))
}

#[derive(Deserialize)]
struct DeleteCommentForm {
    photo_id: Option<PhotoId>,
}

#[post("/deleteComment/{comment_id}")]
async fn delete_comment(
    sql: web::Data<Db>,
    comment_id: web::Path<i64>,
    form: web::Json<DeleteCommentForm>,
) -> Result<HttpResponse, ApiError> {
    let comment = CommentId(comment_id.into_inner());
    let photo = form
        .photo_id
        .ok_or_else(|| ApiError::bad_request("photo_id is required"))?;

    match store::delete_comment(&**sql, photo, comment).await? {
        CommentRemoval::Removed => {
            debug!("deleted comment {comment} on photo {photo}");
            Ok(HttpResponse::Ok().json(Message::new("Comment deleted")))
        }
        CommentRemoval::PhotoNotFound => Err(ApiError::not_found("Photo not found")),
        CommentRemoval::CommentNotFound => Err(ApiError::not_found("Comment not found")),
    }
}

#[post("/deletePhoto/{photo_id}")]
async fn delete_photo(
    sql: web::Data<Db>,
    config: web::Data<Config>,
    photo_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let photo = PhotoId(photo_id.into_inner());

    let file = store::delete_photo(&**sql, photo)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo not found"))?;

    info!("deleted photo {photo}");

    if let Err(x) = discard_files(&config.upload_dir, &[file]).await {
        warn!("photo {photo} deleted but its image file remains: {x:?}");
    }

    Ok(HttpResponse::Ok().json(Message::new("Photo deleted")))
}

/// Removes stored images. Keeps going past failures and reports the first one.
pub(crate) async fn discard_files(dir: &Path, files: &[String]) -> std::io::Result<()> {
    let mut first_error = None;

    for file in files {
        if !util::is_safe_file_name(file) {
            warn!("refusing to remove {file:?}");
            continue;
        }

        match tokio::fs::remove_file(dir.join(file)).await {
            Ok(()) => {}
            Err(x) if x.kind() == std::io::ErrorKind::NotFound => {
                debug!("{file} was already gone");
            }
            Err(x) => {
                error!("unable to remove {file}: {x:?}");
                first_error.get_or_insert(x);
            }
        }
    }

    match first_error {
        Some(x) => Err(x),
        None => Ok(()),
    }
}

struct FileData {
    data: Vec<u8>,
    filename: String,
    filetype: Mime,
}

/// Reads the first file part of the form. Other parts are skipped.
async fn receive_file(mut payload: Multipart, limit: usize) -> Result<Option<FileData>, ApiError> {
    let malformed = |x: actix_multipart::MultipartError| {
        debug!("malformed upload: {x}");
        ApiError::bad_request("Malformed upload")
    };

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let filename = field
            .content_disposition()
            .and_then(|x| x.get_filename())
            .map(str::to_owned);

        let filename = match filename {
            Some(x) => x,
            None => {
                while field.try_next().await.map_err(malformed)?.is_some() {}
                continue;
            }
        };

        let filetype = field
            .content_type()
            .cloned()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);

        let mut data: Vec<u8> = Default::default();

        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if data.len() + chunk.len() > limit {
                return Err(ApiError::bad_request("File too large"));
            }

            data.extend_from_slice(&chunk);
        }

        return Ok(Some(FileData {
            data,
            filename,
            filetype,
        }));
    }

    Ok(None)
}

#[post("/photos/new")]
async fn upload(
    payload: Multipart,
    session: Session,
    sql: web::Data<Db>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let filedata = match receive_file(payload, config.max_upload.as_u64() as usize).await? {
        Some(x) if !x.data.is_empty() => x,
        _ => return Err(ApiError::bad_request("No file uploaded")),
    };

    if filedata.filetype.type_() != mime::IMAGE {
        return Err(ApiError::bad_request("Only images can be uploaded"));
    }

    // svg can carry script and would run on our origin
    if filedata.filetype.subtype() == mime::SVG {
        return Err(ApiError::bad_request("SVG images are not accepted"));
    }

    let file_name = util::generate_file_name(&filedata.filename, &filedata.filetype);

    debug!(
        "Upload requested: {}, MIME: {}, FileName: {}, {} bytes",
        file_name,
        filedata.filetype,
        filedata.filename,
        filedata.data.len()
    );

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let path = config.upload_dir.join(&file_name);
    tokio::fs::write(&path, &filedata.data).await?;

    // drop the file again unless the row makes it into the db
    let written = scopeguard::guard(path, |path| {
        if let Err(x) = std::fs::remove_file(&path) {
            error!("unable to clean up {}: {x:?}", path.display());
        }
    });

    let photo = store::insert_photo(
        &**sql,
        session.user.id,
        &file_name,
        filedata.filetype.essence_str(),
        OffsetDateTime::now_utc(),
    )
    .await?;

    scopeguard::ScopeGuard::into_inner(written);

    info!("user {} uploaded photo {}", session.user.id, photo.id);

    Ok(HttpResponse::Ok().json(photo))
}

#[get("/images/{file_name}")]
async fn image(
    sql: web::Data<Db>,
    config: web::Data<Config>,
    file_name: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let file_name = file_name.into_inner();

    if !util::is_safe_file_name(&file_name) {
        return Err(ApiError::not_found("Image not found"));
    }

    let photo = store::find_photo_by_file(&**sql, &file_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    let data = match tokio::fs::read(config.upload_dir.join(&photo.file_name)).await {
        Ok(x) => x,
        Err(x) if x.kind() == std::io::ErrorKind::NotFound => {
            warn!("photo {} has no file on disk", photo.id);
            return Err(ApiError::not_found("Image not found"));
        }
        Err(x) => return Err(x.into()),
    };

    let mime: Mime = photo.mime.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);

    Ok(HttpResponse::Ok()
        .append_header((
            "Content-Disposition",
            format!("inline; filename=\"{}\"", photo.file_name),
        ))
        .append_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .append_header((header::CONTENT_SECURITY_POLICY, "sandbox"))
        .content_type(mime)
        .body(data))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(photos_of_user)
        .service(like)
        .service(add_comment)
        .service(delete_comment)
        .service(delete_photo)
        .service(upload)
        .service(image);
}

#[cfg(test)]
mod tests {
    use actix_web::{cookie::Cookie, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        auth::TOKEN_COOKIE,
        model::PhotoDocument,
        store::tests::{seed_photo, seed_user, test_pool},
    };

    macro_rules! app {
        ($sql:expr, $config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($sql.clone()))
                    .app_data(web::Data::new($config.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    async fn login(sql: &Db, user: UserId) -> Cookie<'static> {
        let token = util::generate_token();
        store::create_session(sql, user, &token, OffsetDateTime::now_utc().unix_timestamp())
            .await
            .unwrap();
        Cookie::new(TOKEN_COOKIE, token)
    }

    fn multipart(filename: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
        let boundary = "----photoshareboundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    #[actix_web::test]
    async fn user_without_photos_gets_null() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let ann = seed_user(&sql, "ann", "Ann").await;

        let req = test::TestRequest::get()
            .uri(&format!("/photosOfUser/{ann}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await, "null");

        // unknown users have no photos either
        let req = test::TestRequest::get().uri("/photosOfUser/1234").to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "null");
    }

    #[actix_web::test]
    async fn comment_and_like_end_to_end() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let b = seed_user(&sql, "b", "Ben").await;
        let p = seed_photo(&sql, a, "p.png").await;
        let b_cookie = login(&sql, b).await;

        let req = test::TestRequest::post()
            .uri(&format!("/commentsOfPhoto/{p}"))
            .cookie(b_cookie.clone())
            .set_json(json!({ "comment": "  hi " }))
            .to_request();
        let photo: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(photo["comments"][0]["comment"], "hi");
        assert_eq!(photo["comments"][0]["user_id"], b.0);

        let req = test::TestRequest::post()
            .uri(&format!("/likePhoto/{p}"))
            .set_json(json!({ "user_id": b }))
            .to_request();
        let body: Message = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "Photo liked");

        let req = test::TestRequest::get()
            .uri(&format!("/photosOfUser/{a}"))
            .to_request();
        let photos: Value = test::call_and_read_body_json(&app, req).await;

        let ben = json!({ "id": b, "first_name": "Ben", "last_name": "Benson" });
        assert_eq!(photos.as_array().unwrap().len(), 1);
        assert_eq!(photos[0]["id"], p.0);
        assert_eq!(photos[0]["comments"][0]["user"], ben);
        assert!(photos[0]["comments"][0].get("user_id").is_none());
        assert_eq!(photos[0]["likes"], json!([ben]));
    }

    #[actix_web::test]
    async fn photos_are_ordered_by_likes() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let b = seed_user(&sql, "b", "Ben").await;
        let first = seed_photo(&sql, a, "1.png").await;
        let second = seed_photo(&sql, a, "2.png").await;
        store::toggle_like(&sql, first, a).await.unwrap();
        store::toggle_like(&sql, first, b).await.unwrap();
        store::toggle_like(&sql, second, b).await.unwrap();
        // a commenter that no longer exists
        store::add_comment(&sql, second, UserId(77), "old", OffsetDateTime::now_utc())
            .await
            .unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/photosOfUser/{a}"))
            .to_request();
        let photos: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(photos[0]["id"], first.0);
        assert_eq!(photos[0]["likes"].as_array().unwrap().len(), 2);
        assert_eq!(photos[1]["id"], second.0);
        assert_eq!(photos[1]["comments"][0]["user"], json!({ "id": 77 }));
    }

    #[actix_web::test]
    async fn like_toggle_errors_and_round_trip() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let p = seed_photo(&sql, a, "p.png").await;

        let req = test::TestRequest::post()
            .uri(&format!("/likePhoto/{p}"))
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/likePhoto/999")
            .set_json(json!({ "user_id": a }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        for expected in ["Photo liked", "Photo unliked"] {
            let req = test::TestRequest::post()
                .uri(&format!("/likePhoto/{p}"))
                .set_json(json!({ "user_id": a }))
                .to_request();
            let body: Message = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body.message, expected);
        }

        assert!(store::find_photo(&sql, p).await.unwrap().unwrap().likes.is_empty());
    }

    #[actix_web::test]
    async fn comment_rules() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let p = seed_photo(&sql, a, "p.png").await;
        let cookie = login(&sql, a).await;

        let req = test::TestRequest::post()
            .uri(&format!("/commentsOfPhoto/{p}"))
            .set_json(json!({ "comment": "nice!" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri(&format!("/commentsOfPhoto/{p}"))
            .cookie(cookie.clone())
            .set_json(json!({ "comment": "   " }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/commentsOfPhoto/404")
            .cookie(cookie.clone())
            .set_json(json!({ "comment": "nice!" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let before = store::find_photo(&sql, p).await.unwrap().unwrap().comments.len();

        let req = test::TestRequest::post()
            .uri(&format!("/commentsOfPhoto/{p}"))
            .cookie(cookie)
            .set_json(json!({ "comment": "nice!" }))
            .to_request();
        let photo: Value = test::call_and_read_body_json(&app, req).await;

        let comments = photo["comments"].as_array().unwrap();
        assert_eq!(comments.len(), before + 1);
        assert_eq!(comments[0]["user_id"], a.0);
        assert!(comments[0]["date_time"].is_string());
    }

    #[actix_web::test]
    async fn delete_comment_and_photo_routes() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let p = seed_photo(&sql, a, "p.png").await;
        let doc: PhotoDocument = store::add_comment(&sql, p, a, "hi", OffsetDateTime::now_utc())
            .await
            .unwrap()
            .unwrap();
        let comment = doc.comments[0].id;

        let req = test::TestRequest::post()
            .uri(&format!("/deleteComment/{comment}"))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "photo_id is required");

        let req = test::TestRequest::post()
            .uri(&format!("/deleteComment/{comment}"))
            .set_json(json!({ "photo_id": 999 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::post()
            .uri(&format!("/deleteComment/{comment}"))
            .set_json(json!({ "photo_id": p }))
            .to_request();
        let body: Message = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "Comment deleted");

        let req = test::TestRequest::post()
            .uri(&format!("/deleteComment/{comment}"))
            .set_json(json!({ "photo_id": p }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::post()
            .uri(&format!("/deletePhoto/{p}"))
            .to_request();
        let body: Message = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "Photo deleted");

        let req = test::TestRequest::post()
            .uri(&format!("/deletePhoto/{p}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn upload_serve_and_delete() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let cookie = login(&sql, a).await;
        let bytes = b"\x89PNG\r\n\x1a\nnot really a png";

        let (content_type, body) = multipart("cat.png", "image/png", bytes);
        let req = test::TestRequest::post()
            .uri("/photos/new")
            .insert_header((header::CONTENT_TYPE, content_type.clone()))
            .set_payload(body.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/photos/new")
            .cookie(cookie.clone())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        let photo: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(photo["user_id"], a.0);
        let file_name = photo["file_name"].as_str().unwrap().to_owned();
        assert!(file_name.ends_with(".png"));
        assert!(config.upload_dir.join(&file_name).exists());

        let req = test::TestRequest::get()
            .uri(&format!("/images/{file_name}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert_eq!(
            resp.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_SECURITY_POLICY).unwrap(),
            "sandbox"
        );
        assert_eq!(test::read_body(resp).await, &bytes[..]);

        let req = test::TestRequest::post()
            .uri(&format!("/deletePhoto/{}", photo["id"]))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
        assert!(!config.upload_dir.join(&file_name).exists());

        let req = test::TestRequest::get()
            .uri(&format!("/images/{file_name}"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let _ = std::fs::remove_dir_all(&config.upload_dir);
    }

    #[actix_web::test]
    async fn upload_rejects_non_images_and_oversized_files() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let cookie = login(&sql, a).await;

        let (content_type, body) = multipart("notes.txt", "text/plain", b"hello");
        let req = test::TestRequest::post()
            .uri("/photos/new")
            .cookie(cookie.clone())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
        let (content_type, body) = multipart("x.svg", "image/svg+xml", svg);
        let req = test::TestRequest::post()
            .uri("/photos/new")
            .cookie(cookie.clone())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let big = vec![0u8; config.max_upload.as_u64() as usize + 1];
        let (content_type, body) = multipart("big.png", "image/png", &big);
        let req = test::TestRequest::post()
            .uri("/photos/new")
            .cookie(cookie)
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        assert_eq!(store::counts(&sql).await.unwrap().photo, 0);
    }

    #[actix_web::test]
    async fn failed_insert_removes_written_file() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let cookie = login(&sql, a).await;
        sqlx::query("DROP TABLE photos").execute(&sql).await.unwrap();

        let (content_type, body) = multipart("cat.png", "image/png", b"\x89PNG\r\n\x1a\n");
        let req = test::TestRequest::post()
            .uri("/photos/new")
            .cookie(cookie)
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 500);

        let left = std::fs::read_dir(&config.upload_dir).unwrap().count();
        assert_eq!(left, 0);

        let _ = std::fs::remove_dir_all(&config.upload_dir);
    }

    #[actix_web::test]
    async fn photo_fetch_failure_is_bad_request() {
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        seed_photo(&sql, a, "p.png").await;
        sqlx::query("DROP TABLE comments").execute(&sql).await.unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/photosOfUser/{a}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], format!("Photos for user with id {a}: Not Found"));
    }

    #[actix_web::test]
    async fn author_lookup_failures_name_their_phase() {
        // commented photo: the comment phase hits the broken users table first
        let sql = test_pool().await;
        let config = Config::for_tests();
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let p = seed_photo(&sql, a, "p.png").await;
        store::add_comment(&sql, p, a, "hi", OffsetDateTime::now_utc())
            .await
            .unwrap();
        store::toggle_like(&sql, p, a).await.unwrap();
        sqlx::query("DROP TABLE users").execute(&sql).await.unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/photosOfUser/{a}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Error processing comments" }));

        // liked but uncommented: only the like phase does lookups
        let sql = test_pool().await;
        let app = app!(sql, config);
        let a = seed_user(&sql, "a", "Ann").await;
        let p = seed_photo(&sql, a, "p.png").await;
        store::toggle_like(&sql, p, a).await.unwrap();
        sqlx::query("DROP TABLE users").execute(&sql).await.unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/photosOfUser/{a}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Error processing likes" }));
    }
}
