//! Git-backed VCS command gateway
//!
//! Maps the gateway primitives onto libgit2 with a few Mercurial-flavoured
//! conventions: new repositories start on a `default` branch, `tip` names
//! the working-copy parent, and a branch may have several heads (the local
//! branch plus any remote-tracking branch of the same short name).

use std::collections::HashMap;
use std::path::Path;

use git2::{
    BranchType, ConfigLevel, ErrorCode, ObjectType, Oid, Repository, ResetType, Sort,
    StatusOptions,
};
use tracing::debug;

use crate::error::{Result, VcsError};
use crate::models::{CommitInfo, FileState, MergeReport, RepositoryState, StatusEntry, TagRef};
use crate::services::gateway::{RevSpec, VcsGateway};

/// Name of the branch a new repository starts on
pub const DEFAULT_BRANCH: &str = "default";

/// Symbolic name for the working-copy parent
pub const TIP: &str = "tip";

/// Gateway implementation over libgit2
#[derive(Debug, Clone, Copy, Default)]
pub struct GitGateway;

impl GitGateway {
    pub fn new() -> Self {
        GitGateway
    }

    fn open(path: &Path) -> Result<Repository> {
        if !path.exists() {
            return Err(VcsError::PreconditionViolated(format!(
                "path does not exist: {}",
                path.display()
            )));
        }

        Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => VcsError::PreconditionViolated(format!(
                "not an initialized repository: {}",
                path.display()
            )),
            _ => VcsError::Git(e),
        })
    }
}

/// Resolve a revision string to a commit. `tip` maps to HEAD.
fn find_commit<'r>(repo: &'r Repository, rev: &str) -> Result<git2::Commit<'r>> {
    let spec = if rev == TIP { "HEAD" } else { rev };
    let object = repo.revparse_single(spec).map_err(|e| match e.code() {
        ErrorCode::NotFound
        | ErrorCode::Ambiguous
        | ErrorCode::InvalidSpec
        | ErrorCode::UnbornBranch => VcsError::AmbiguousReference(rev.to_string()),
        _ => VcsError::Git(e),
    })?;
    Ok(object.peel_to_commit()?)
}

/// The working-copy parent; an empty repository has none
fn head_commit(repo: &Repository) -> Result<git2::Commit<'_>> {
    match repo.head() {
        Ok(head) => Ok(head.peel_to_commit()?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Err(
            VcsError::PreconditionViolated("repository has no commits".to_string()),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Branch HEAD is attached to, including an unborn one
fn head_branch(repo: &Repository) -> Result<Option<String>> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
        Ok(_) => Ok(None),
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(str::to_string))
        }
        Err(e) => Err(e.into()),
    }
}

/// Map of local branch tips to branch names. HEAD's branch wins when
/// several branches point at the same commit.
fn branch_tips(repo: &Repository) -> Result<HashMap<Oid, String>> {
    let mut tips = HashMap::new();

    for item in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = item?;
        if let (Some(oid), Ok(Some(name))) = (branch.get().target(), branch.name()) {
            tips.entry(oid).or_insert_with(|| name.to_string());
        }
    }

    if let (Ok(head), Some(name)) = (repo.head(), head_branch(repo)?) {
        if let Some(oid) = head.target() {
            tips.insert(oid, name);
        }
    }

    Ok(tips)
}

/// Candidate heads of `branch` with superseded candidates removed
fn head_oids(repo: &Repository, branch: &str) -> Result<Vec<Oid>> {
    let mut candidates = Vec::new();

    if let Ok(local) = repo.find_branch(branch, BranchType::Local) {
        candidates.extend(local.get().target());
    }

    for item in repo.branches(Some(BranchType::Remote))? {
        let (remote, _) = item?;
        let Some(name) = remote.name()? else {
            continue;
        };
        // "origin/dev" tracks "dev"
        if name.split_once('/').map(|(_, short)| short) == Some(branch) {
            candidates.extend(remote.get().target());
        }
    }

    candidates.sort();
    candidates.dedup();

    let mut heads = Vec::with_capacity(candidates.len());
    for &oid in &candidates {
        let mut superseded = false;
        for &other in &candidates {
            if other != oid && repo.graph_descendant_of(other, oid)? {
                superseded = true;
                break;
            }
        }
        if !superseded {
            heads.push(oid);
        }
    }

    Ok(heads)
}

fn signature(repo: &Repository) -> Result<git2::Signature<'static>> {
    repo.signature()
        .or_else(|_| git2::Signature::now("branchcraft", "branchcraft@localhost"))
        .map_err(VcsError::from)
}

impl VcsGateway for GitGateway {
    fn init(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;

        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head(DEFAULT_BRANCH);
        Repository::init_opts(path, &opts)?;

        debug!(path = %path.display(), "initialized repository");
        Ok(())
    }

    fn commit(&self, path: &Path, message: &str, add_remove: bool) -> Result<CommitInfo> {
        let mut repo = Self::open(path)?;
        let mut index = repo.index()?;

        if index.has_conflicts() {
            return Err(VcsError::PreconditionViolated(
                "index has unresolved conflicts".to_string(),
            ));
        }

        if add_remove {
            index.add_all(["*"], git2::IndexAddOption::DEFAULT, None)?;
        }
        index.update_all(["*"], None)?;
        index.write()?;
        let tree_oid = index.write_tree()?;

        let mut merge_heads = Vec::new();
        if repo.state() == git2::RepositoryState::Merge {
            repo.mergehead_foreach(|oid| {
                merge_heads.push(*oid);
                true
            })?;
        }

        let parent = match head_commit(&repo) {
            Ok(commit) => Some(commit),
            Err(VcsError::PreconditionViolated(_)) => None,
            Err(e) => return Err(e),
        };

        let unchanged = match &parent {
            Some(parent) => parent.tree_id() == tree_oid,
            None => index.is_empty(),
        };
        if unchanged && merge_heads.is_empty() {
            return Err(VcsError::NothingToCommit);
        }

        let tree = repo.find_tree(tree_oid)?;
        let sig = signature(&repo)?;

        let mut parents: Vec<git2::Commit> = parent.into_iter().collect();
        for oid in &merge_heads {
            parents.push(repo.find_commit(*oid)?);
        }
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?;
        repo.cleanup_state()?;

        let commit = repo.find_commit(oid)?;
        debug!(hash = %oid, parents = parent_refs.len(), "created commit");
        Ok(CommitInfo::from_git2(&commit, head_branch(&repo)?))
    }

    fn update(&self, path: &Path, rev: &str) -> Result<()> {
        let repo = Self::open(path)?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();

        if let Ok(branch) = repo.find_branch(rev, BranchType::Local) {
            let reference = branch.get();
            let refname = reference
                .name()
                .ok_or_else(|| VcsError::AmbiguousReference(rev.to_string()))?;
            let target = reference.peel(ObjectType::Commit)?;
            repo.checkout_tree(&target, Some(&mut checkout))?;
            repo.set_head(refname)?;
        } else {
            let commit = find_commit(&repo, rev)?;
            repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
            repo.set_head_detached(commit.id())?;
        }

        debug!(path = %path.display(), rev, "updated working copy");
        Ok(())
    }

    fn branch(&self, path: &Path, name: &str) -> Result<()> {
        let repo = Self::open(path)?;

        if repo.find_branch(name, BranchType::Local).is_ok() {
            return Err(VcsError::PreconditionViolated(format!(
                "branch '{}' already exists",
                name
            )));
        }

        match head_commit(&repo) {
            Ok(commit) => {
                let branch = repo.branch(name, &commit, false)?;
                let refname = branch
                    .get()
                    .name()
                    .ok_or_else(|| VcsError::AmbiguousReference(name.to_string()))?;
                repo.set_head(refname)?;
            }
            // Nothing committed yet: the branch is born with the first commit
            Err(VcsError::PreconditionViolated(_)) => {
                repo.set_head(&format!("refs/heads/{}", name))?;
            }
            Err(e) => return Err(e),
        }

        debug!(path = %path.display(), branch = name, "switched to new branch");
        Ok(())
    }

    fn current_branch(&self, path: &Path) -> Result<Option<String>> {
        let repo = Self::open(path)?;
        head_branch(&repo)
    }

    fn tip(&self, path: &Path) -> Result<CommitInfo> {
        let repo = Self::open(path)?;
        let commit = head_commit(&repo)?;
        Ok(CommitInfo::from_git2(&commit, head_branch(&repo)?))
    }

    fn log(&self, path: &Path, spec: &RevSpec) -> Result<Vec<CommitInfo>> {
        let repo = Self::open(path)?;
        let tips = branch_tips(&repo)?;

        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        match spec {
            RevSpec::Rev(rev) => {
                let commit = find_commit(&repo, rev)?;
                let branch = tips.get(&commit.id()).cloned();
                return Ok(vec![CommitInfo::from_git2(&commit, branch)]);
            }
            RevSpec::Ancestors(rev) => {
                walk.push(find_commit(&repo, rev)?.id())?;
            }
            RevSpec::Branch(name) => {
                let heads = head_oids(&repo, name)?;
                if heads.is_empty() {
                    return Err(VcsError::AmbiguousReference(name.clone()));
                }
                for oid in heads {
                    walk.push(oid)?;
                }
            }
            RevSpec::All => {
                walk.push_glob("refs/heads/*")?;
                walk.push_glob("refs/remotes/*")?;
            }
        }

        walk.map(|oid| -> Result<CommitInfo> {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            Ok(CommitInfo::from_git2(&commit, tips.get(&oid).cloned()))
        })
        .collect()
    }

    fn heads(&self, path: &Path, branch: &str) -> Result<Vec<CommitInfo>> {
        let repo = Self::open(path)?;

        let mut heads = head_oids(&repo, branch)?
            .into_iter()
            .map(|oid| -> Result<CommitInfo> {
                let commit = repo.find_commit(oid)?;
                Ok(CommitInfo::from_git2(&commit, Some(branch.to_string())))
            })
            .collect::<Result<Vec<_>>>()?;

        heads.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.hash.cmp(&b.hash)));
        Ok(heads)
    }

    fn status(&self, path: &Path, include_clean: bool) -> Result<Vec<StatusEntry>> {
        let repo = Self::open(path)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .include_unmodified(include_clean);

        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .map(|entry| StatusEntry {
                file: entry.path().unwrap_or("").to_string(),
                state: FileState::from(entry.status()),
            })
            .collect())
    }

    fn state(&self, path: &Path) -> Result<RepositoryState> {
        let repo = Self::open(path)?;
        Ok(RepositoryState::from(repo.state()))
    }

    fn merge(&self, path: &Path, rev: &str) -> Result<MergeReport> {
        let repo = Self::open(path)?;
        let commit = find_commit(&repo, rev)?;
        let annotated = repo.find_annotated_commit(commit.id())?;

        let (analysis, _preference) = repo.merge_analysis(&[&annotated])?;
        if analysis.is_up_to_date() {
            return Ok(MergeReport::default());
        }
        if analysis.is_unborn() {
            return Err(VcsError::PreconditionViolated(
                "cannot merge into a repository with no commits".to_string(),
            ));
        }

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        repo.merge(&[&annotated], None, Some(&mut checkout))?;

        let index = repo.index()?;
        if index.has_conflicts() {
            let mut files = Vec::new();
            for conflict in index.conflicts()? {
                let conflict = conflict?;
                if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                    files.push(String::from_utf8_lossy(&entry.path).to_string());
                }
            }
            files.sort();
            files.dedup();

            return Ok(MergeReport {
                succeeded: false,
                conflicted: true,
                unresolved_files: files,
            });
        }

        Ok(MergeReport {
            succeeded: true,
            conflicted: false,
            unresolved_files: Vec::new(),
        })
    }

    fn abort_merge(&self, path: &Path) -> Result<()> {
        let repo = Self::open(path)?;
        repo.cleanup_state()?;

        let head = head_commit(&repo)?;
        repo.reset(head.as_object(), ResetType::Hard, None)?;

        debug!(path = %path.display(), hash = %head.id(), "rolled back pending merge");
        Ok(())
    }

    fn reset(&self, path: &Path, rev: &str) -> Result<()> {
        let repo = Self::open(path)?;
        let commit = find_commit(&repo, rev)?;

        repo.cleanup_state()?;
        repo.reset(commit.as_object(), ResetType::Hard, None)?;

        debug!(path = %path.display(), hash = %commit.id(), "reset working copy");
        Ok(())
    }

    fn is_ancestor(&self, path: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        let repo = Self::open(path)?;
        let ancestor = find_commit(&repo, ancestor)?.id();
        let descendant = find_commit(&repo, descendant)?.id();
        Ok(ancestor == descendant || repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn tags(&self, path: &Path) -> Result<Vec<TagRef>> {
        let repo = Self::open(path)?;
        let mut tags = Vec::new();

        repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name);
            let short_name = name.strip_prefix("refs/tags/").unwrap_or(&name).to_string();

            // Annotated tags peel through the tag object; tags on trees or blobs are skipped
            if let Ok(commit) = repo.find_object(oid, None).and_then(|o| o.peel_to_commit()) {
                tags.push(TagRef {
                    name: short_name,
                    rev: commit.id().to_string(),
                });
            }
            true
        })?;

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn tag(&self, path: &Path, name: &str, rev: &str) -> Result<TagRef> {
        let repo = Self::open(path)?;
        let commit = find_commit(&repo, rev)?;

        repo.tag_lightweight(name, commit.as_object(), false)
            .map_err(|e| match e.code() {
                ErrorCode::Exists => {
                    VcsError::PreconditionViolated(format!("tag '{}' already exists", name))
                }
                _ => VcsError::Git(e),
            })?;

        debug!(tag = name, hash = %commit.id(), "created tag");
        Ok(TagRef {
            name: name.to_string(),
            rev: commit.id().to_string(),
        })
    }

    fn config_get(&self, path: &Path, key: &str) -> Result<Option<String>> {
        let repo = Self::open(path)?;
        let config = repo.config()?;

        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn config_set(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        let repo = Self::open(path)?;
        let mut config = repo.config()?.open_level(ConfigLevel::Local)?;

        config.set_str(key, value)?;
        debug!(key, value, "updated repository config");
        Ok(())
    }
}
