//! Wires the configured acme transports, syntax engine and resolver into a
//! session context.

use std::sync::Arc;

use anyhow::Context;
use tinct_acme::{AcmeStyles, AcmeWindows};
use tinct_highlight::StyleTable;
use tinct_language::{LanguageId, LanguageResolver};
use tinct_session::{AnnotationSource, Services, SessionContext};
use tinct_syntax::SyntaxEngine;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

pub fn build_context(config: &Config, cancel: CancellationToken) -> anyhow::Result<Arc<SessionContext>> {
	let styles = match &config.style_file {
		Some(path) => StyleTable::load(path).with_context(|| format!("loading style file {}", path.display()))?,
		None => StyleTable::builtin(),
	};

	let mut engine = SyntaxEngine::builtin();
	if let Some(dir) = &config.query_dir {
		let loaded = engine.load_query_overrides(dir);
		tracing::info!(dir = %dir.display(), loaded, "queries.overrides");
	}

	let mut resolver = LanguageResolver::new(engine.languages());
	for (interpreter, language) in &config.interpreters {
		resolver.register_interpreter(interpreter, LanguageId::from(language.as_str()));
	}
	for handler in &config.filename_handlers {
		resolver.add_handler(&handler.pattern, handler.language_id.as_str())?;
	}
	tracing::info!(
		languages = engine.languages().len(),
		handlers = resolver.handler_count(),
		styles = styles.len(),
		"daemon.configured"
	);

	let services = Services {
		windows: Arc::new(AcmeWindows::new(&config.acme.root)),
		compositor: Arc::new(AcmeStyles::new(&config.acme.styles_root)),
		annotations: Arc::new(engine),
	};
	Ok(SessionContext::new(services, resolver, styles, config.session_settings(), cancel))
}
