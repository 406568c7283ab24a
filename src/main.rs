use std::env;
use std::process;
use std::sync::Arc;

use log::*;
use warp::filters::log::Info;
use warp::Filter;

use bank_front::{api, db, Config, NewService, Service, SystemCalendar};

#[tokio::main]
async fn main() {
	if env::var_os("RUST_LOG").is_none() {
		env::set_var("RUST_LOG", "info");
	}
	pretty_env_logger::init();
	
	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("configuration: {}", e);
			process::exit(1);
		}
	};
	
	let pool = match db::connect(&config.database_url, config.pool_size) {
		Ok(pool) => pool,
		Err(e) => {
			error!("{}", e);
			process::exit(1);
		}
	};
	
	let service = Service::new(NewService {
		db: pool,
		calendar: Arc::new(SystemCalendar),
	});
	
	let log = warp::log::custom(|info: Info| {
		info!(
			target: "bank_front::api",
			"\"{} {} {:?}\" \t{} {} {:?}",
			info.method(),
			info.path(),
			info.version(),
			info.status().canonical_reason().unwrap_or("-"),
			info.status().as_u16(),
			info.elapsed(),
		);
	});
	let routes = api::routes(service, config.success_url.clone()).with(log);
	
	info!("listening on {}", config.bind_addr);
	warp::serve(routes).run(config.bind_addr).await;
}
