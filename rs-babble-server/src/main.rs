mod config;

use actix_web::{App, HttpResponse, HttpServer, Responder, delete, get, put, web};
use log::{error, info};
use serde::Deserialize;

use config::BabbleConfig;
use rs_babble_core::{CorpusStore, Engine, JsonFileBackend, ReplyOptions, StoreError};

/// Query parameters for the `/v1/groups/{group}/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	/// Text the reply should relate to (e.g. the message being answered)
	seed: Option<String>,
	max_len: Option<usize>,
}

/// Limits on what gets learned, applied before the engine sees a message.
#[derive(Clone)]
struct IngestPolicy {
	min_message_len: usize,
}

/// HTTP GET endpoint `/v1/groups/{group}/generate`
///
/// Returns generated text, or one of the sentinels
/// `insufficient data` / `generation failed`, as the response body.
#[get("/v1/groups/{group}/generate")]
async fn get_generated(
	engine: web::Data<Engine>,
	defaults: web::Data<ReplyOptions>,
	path: web::Path<String>,
	query: web::Query<GenerateParams>,
) -> impl Responder {
	let group = path.into_inner();
	let mut options = defaults.get_ref().clone();
	match query.max_len {
		Some(0) => return HttpResponse::BadRequest().body("max_len must be positive"),
		Some(max_len) => options.max_len = max_len,
		None => (),
	}
	let seed = query.seed.clone();

	match web::block(move || engine.generate_reply(&group, seed.as_deref(), &options, &mut rand::rng())).await {
		Ok(reply) => HttpResponse::Ok().body(reply.into_string()),
		Err(e) => HttpResponse::InternalServerError().body(format!("Generation failed: {e}")),
	}
}

/// HTTP PUT endpoint `/v1/groups/{group}/messages`
///
/// Learns the request body as one message of the group.
#[put("/v1/groups/{group}/messages")]
async fn put_message(
	engine: web::Data<Engine>,
	policy: web::Data<IngestPolicy>,
	path: web::Path<String>,
	body: String,
) -> impl Responder {
	let group = path.into_inner();
	let text = body.trim().to_owned();
	if text.is_empty() {
		return HttpResponse::BadRequest().body("Missing or empty message");
	}
	if text.chars().count() < policy.min_message_len {
		return HttpResponse::Ok().body("ignored");
	}

	match web::block(move || engine.ingest(&group, &text)).await {
		Ok(Ok(true)) => HttpResponse::Ok().body("inserted"),
		Ok(Ok(false)) => HttpResponse::Ok().body("duplicate"),
		Ok(Err(StoreError::EmptyText)) => HttpResponse::BadRequest().body("Missing or empty message"),
		Ok(Err(e @ StoreError::Load { .. })) => {
			error!("{e}");
			HttpResponse::ServiceUnavailable().body(format!("Not learned: {e}"))
		}
		Ok(Err(e)) => {
			error!("{e}");
			HttpResponse::InternalServerError().body(format!("Learned but not persisted: {e}"))
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Ingest failed: {e}")),
	}
}

/// HTTP GET endpoint `/v1/groups/{group}/corpus`
///
/// Returns the group's corpus as a JSON array, oldest message first.
#[get("/v1/groups/{group}/corpus")]
async fn get_corpus(engine: web::Data<Engine>, path: web::Path<String>) -> impl Responder {
	let group = path.into_inner();
	match web::block(move || engine.snapshot(&group)).await {
		Ok(entries) => HttpResponse::Ok().json(entries),
		Err(e) => HttpResponse::InternalServerError().body(format!("Snapshot failed: {e}")),
	}
}

/// HTTP DELETE endpoint `/v1/groups/{group}`
///
/// Forgets everything the group taught.
#[delete("/v1/groups/{group}")]
async fn delete_group(engine: web::Data<Engine>, path: web::Path<String>) -> impl Responder {
	let group = path.into_inner();
	match web::block(move || engine.reset(&group)).await {
		Ok(Ok(())) => HttpResponse::Ok().body("Group reset"),
		Ok(Err(e)) => {
			error!("{e}");
			HttpResponse::InternalServerError().body(format!("Reset in memory but not persisted: {e}"))
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Reset failed: {e}")),
	}
}

/// HTTP GET endpoint `/v1/groups`
///
/// Lists groups with a persisted corpus, one per line.
#[get("/v1/groups")]
async fn get_groups(backend: web::Data<JsonFileBackend>) -> impl Responder {
	match web::block(move || backend.list_groups()).await {
		Ok(Ok(groups)) => HttpResponse::Ok().body(groups.join("\n")),
		_ => HttpResponse::InternalServerError().body("Failed to list groups"),
	}
}

/// Main entry point for the server.
///
/// Loads the configuration, opens the corpus directory, and starts an
/// Actix-web HTTP server exposing the engine.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = BabbleConfig::load()?;
	info!(
		"Loaded config: {}:{} ({} workers), data_dir={}, capacity={}, max_len={}, seed_probability={}",
		config.server.host,
		config.server.port,
		config.server.workers,
		config.corpus.data_dir.display(),
		config.corpus.capacity,
		config.reply.max_len,
		config.reply.seed_probability,
	);

	let backend = JsonFileBackend::new(&config.corpus.data_dir)?;
	let engine = web::Data::new(Engine::new(CorpusStore::with_capacity(backend.clone(), config.corpus.capacity)));
	let backend = web::Data::new(backend);
	let defaults = web::Data::new(config.reply.clone());
	let policy = web::Data::new(IngestPolicy { min_message_len: config.corpus.min_message_len });

	HttpServer::new(move || {
		App::new()
			.app_data(engine.clone())
			.app_data(backend.clone())
			.app_data(defaults.clone())
			.app_data(policy.clone())
			.service(get_generated)
			.service(put_message)
			.service(get_corpus)
			.service(delete_group)
			.service(get_groups)
	})
		.workers(config.server.workers.max(1))
		.bind((config.server.host.as_str(), config.server.port))?
		.run()
		.await?;

	Ok(())
}
