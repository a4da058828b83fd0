use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use sqlx::sqlite::SqlitePoolOptions;

mod aggregate;
mod auth;
mod config;
mod error;
mod info;
mod model;
mod photos;
mod store;
mod users;
mod util;
mod validation;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::load()?;

    let sql = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await
        .map_err(|x| std::io::Error::new(std::io::ErrorKind::Other, x))?;

    sqlx::migrate!("./migrations")
        .run(&sql)
        .await
        .map_err(|x| std::io::Error::new(std::io::ErrorKind::Other, x))?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let bind = (config.bind_address.clone(), config.port);
    info!("listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new(
                "%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %T",
            ))
            .app_data(web::Data::new(sql.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(users::configure)
            .configure(photos::configure)
            .configure(info::configure)
    })
    .bind(bind)?
    .run()
    .await
}
