use std::env;

use anyhow::{anyhow, Result};

const USAGE: &str = "usage: issue-token --role <role> --sub <subject> \
                     [--student <id>]... [--minutes <n>]";

fn main() -> Result<()> {
    let args = parse_args()?;
    let token =
        gradegate::issue_token(&args.role, &args.subject, &args.student_ids, args.minutes)?;
    println!("{token}");
    Ok(())
}

struct Args {
    role: String,
    subject: String,
    student_ids: Vec<String>,
    minutes: Option<i64>,
}

fn parse_args() -> Result<Args> {
    let mut role = None;
    let mut subject = None;
    let mut student_ids = Vec::new();
    let mut minutes = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--role" => {
                role = Some(args.next().ok_or_else(|| anyhow!("--role missing value"))?);
            }
            "--sub" => {
                subject = Some(args.next().ok_or_else(|| anyhow!("--sub missing value"))?);
            }
            "--student" => {
                student_ids.push(args.next().ok_or_else(|| anyhow!("--student missing value"))?);
            }
            "--minutes" => {
                let raw = args.next().ok_or_else(|| anyhow!("--minutes missing value"))?;
                minutes = Some(raw.parse().map_err(|_| anyhow!("--minutes must be an integer"))?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => return Err(anyhow!("Unknown argument: {arg}\n{USAGE}")),
        }
    }

    Ok(Args {
        role: role.ok_or_else(|| anyhow!("--role is required\n{USAGE}"))?,
        subject: subject.ok_or_else(|| anyhow!("--sub is required\n{USAGE}"))?,
        student_ids,
        minutes,
    })
}
