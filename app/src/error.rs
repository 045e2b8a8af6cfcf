use crossterm::style::Stylize;

pub type Result<T> = std::result::Result<T, Error>;

pub enum Error {
    Pipeline(phase_pipeline::Error),
    MissingToken,
    MissingProject,
}

impl From<phase_pipeline::Error> for Error {
    fn from(value: phase_pipeline::Error) -> Self {
        Self::Pipeline(value)
    }
}

pub fn handle_error(err: Error) {
    use Error::*;
    match err {
        Pipeline(err) => handle_pipeline_error(err),
        MissingToken => eprintln!(
            "{err_label} no access token given\n\n\
            {tip_label} pass --token or set FIGMA_TOKEN in your environment\n",
            err_label = "error:".red().bold(),
            tip_label = "  tip:".green(),
        ),
        MissingProject => eprintln!(
            "{err_label} no project key given\n\n\
            {tip_label} pass --project or use --snapshot with a stored design\n",
            err_label = "error:".red().bold(),
            tip_label = "  tip:".green(),
        ),
    }
}

fn handle_pipeline_error(err: phase_pipeline::Error) {
    use phase_pipeline::Error::*;
    match err {
        IO(err) => eprintln!(
            "{err_label} io error: {err}",
            err_label = "error:".red().bold(),
        ),
        Snapshot(err) => eprintln!(
            "{err_label} snapshot unusable: {err}\n\n\
            {tip_label} re-run 'fqml fetch' to produce a fresh snapshot\n",
            err_label = "error:".red().bold(),
            tip_label = "  tip:".green(),
        ),
        Parse(err) => eprintln!(
            "{err_label} while translating the document: {err}",
            err_label = "error:".red().bold(),
        ),
        Json {
            message,
            line,
            column,
        } => eprintln!(
            "{err_label} document is not valid JSON at {line}:{column}: {message}",
            err_label = "error:".red().bold(),
        ),
        NoDocument => eprintln!(
            "{err_label} nothing to generate from\n\n\
            {tip_label} fetch a document first, or pass --snapshot\n",
            err_label = "error:".red().bold(),
            tip_label = "  tip:".green(),
        ),
        AssetsUnavailable(ids) => eprintln!(
            "{err_label} assets never became available: {ids}",
            err_label = "error:".red().bold(),
            ids = ids.join(", "),
        ),
        Fetch(message) => eprintln!(
            "{err_label} while requesting Figma API: {message}",
            err_label = "error:".red().bold(),
        ),
    }
}
