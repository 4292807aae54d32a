//! # Info Command Implementation
//!
//! Prints the discovered superproject root and a tree of its submodules,
//! each with the state of its `HEAD` and its URL. Everything shown is read
//! from disk; no git command is run.
//!
//! ## Example
//!
//! ```text
//! /home/me/work/app (on master)
//! ├─ lib (on master) git@example.com:lib.git
//! └─ vendor/zlib (detached at 1a2b3c4) git@example.com:zlib.git
//! ```

use anyhow::Result;
use clap::Args;
use ptree::TreeItem;

use groot::ops::{self, InfoReport, SubmoduleInfo};

use crate::cli::GlobalOptions;

/// Describe the superproject and its submodules
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Also show the preferred remote and branch of every submodule
    #[arg(short, long)]
    pub long: bool,
}

pub fn execute(args: InfoArgs, global: &GlobalOptions) -> Result<()> {
    let sp = global.superproject()?;
    let report = ops::info(&sp)?;
    let tree = build_tree(&report, args.long);
    ptree::print_tree(&tree)?;
    Ok(())
}

fn build_tree(report: &InfoReport, long: bool) -> TreeNode {
    TreeNode {
        label: format!("{} ({})", report.root.display(), report.head),
        children: report
            .submodules
            .iter()
            .map(|sub| TreeNode {
                label: submodule_label(sub, long),
                children: Vec::new(),
            })
            .collect(),
    }
}

fn submodule_label(sub: &SubmoduleInfo, long: bool) -> String {
    let mut label = format!("{} ({})", sub.rel_path, sub.head);
    if let Some(url) = &sub.url {
        label.push(' ');
        label.push_str(url);
    }
    if long {
        label.push_str(&format!(
            " [{}/{}]",
            sub.preferred_remote, sub.preferred_branch
        ));
    }
    label
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
