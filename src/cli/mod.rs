use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::proxy::RelayPolicy;

#[derive(Parser, Debug)]
#[command(name = "gift_recommender", version, about = "Gift recommendation wizard and Gemini proxy")]
pub struct Args {
    /// Optional TOML config file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the /recommend proxy.
    Serve(ServeArgs),
    /// Interactive step-by-step wizard against a running proxy.
    Wizard(ClientArgs),
    /// One recommendation attempt from flags.
    Ask(AskArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,

    #[arg(long, value_enum)]
    pub relay: Option<RelayPolicy>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClientArgs {
    #[arg(long)]
    pub proxy_url: Option<String>,

    /// Do not attach the google_search grounding tool.
    #[arg(long, default_value_t = false)]
    pub no_grounding: bool,

    /// Do not request `application/json` output.
    #[arg(long, default_value_t = false)]
    pub no_json_mode: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AskArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    #[arg(long, default_value = "")]
    pub relation: String,

    #[arg(long, default_value = "")]
    pub gender: String,

    #[arg(long, default_value = "")]
    pub occasion: String,

    #[arg(long)]
    pub age: Option<String>,

    #[arg(long)]
    pub budget: Option<u32>,

    /// Repeatable.
    #[arg(long = "interest")]
    pub interests: Vec<String>,

    /// Print the generation request JSON and exit without sending it.
    #[arg(long, default_value_t = false)]
    pub print_request: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_flags_parse() {
        let args = Args::try_parse_from([
            "gift_recommender",
            "ask",
            "--relation", "친구",
            "--gender", "여성",
            "--occasion", "생일",
            "--budget", "70000",
            "--interest", "운동",
            "--interest", "독서",
            "--no-grounding",
        ])
        .unwrap();
        let Command::Ask(ask) = args.command else { panic!("expected ask") };
        assert_eq!(ask.relation, "친구");
        assert_eq!(ask.budget, Some(70_000));
        assert_eq!(ask.interests, ["운동", "독서"]);
        assert!(ask.client.no_grounding);
        assert!(!ask.print_request);
    }

    #[test]
    fn serve_relay_flag() {
        let args = Args::try_parse_from(["gift_recommender", "--debug", "serve", "--relay", "transparent"]).unwrap();
        assert!(args.debug);
        let Command::Serve(s) = args.command else { panic!("expected serve") };
        assert_eq!(s.relay, Some(RelayPolicy::Transparent));
    }
}
