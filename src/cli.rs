//! 命令行界面
//! 每个子命令对应控制台的一个页面/表单操作

use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assignment::AssignmentEditor;
use crate::autocomplete::{Autocomplete, Key, KeyOutcome};
use crate::config::AppConfig;
use crate::error::ConsoleError;
use crate::export::{default_file_name, export_rows, ExportFormat, ExportOptions};
use crate::models::{
    AppFunctionRequest, AppRoleRequest, ApplicationRequest, GrantRequest, Tabular,
};
use crate::output::{render_page, render_table, Notice};
use crate::services::Services;
use crate::table::{ListView, TableQuery};

#[derive(Debug, Parser)]
#[command(name = "rbac-console", version, about = "RBAC administration console")]
pub struct Cli {
    /// 覆盖配置中的后端地址
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// 覆盖配置中的日志级别
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Applications
    #[command(subcommand)]
    Apps(AppsCommand),
    /// Application roles
    #[command(subcommand)]
    Roles(RolesCommand),
    /// Application functions
    #[command(subcommand)]
    Functions(FunctionsCommand),
    /// Role ↔ function assignments
    #[command(subcommand)]
    Rbac(RbacCommand),
    /// User authorization grants
    #[command(subcommand)]
    Grants(GrantsCommand),
    /// User directory
    #[command(subcommand)]
    Users(UsersCommand),
    /// Show the user bound to the current session
    Whoami,
    /// User review forms
    #[command(subcommand)]
    Review(ReviewCommand),
}

/// 列表通用参数
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Case-insensitive keyword matched against every column
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Hide inactive rows
    #[arg(long)]
    pub active_only: bool,
    /// Export all matching rows to a file or directory instead of printing
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// csv, tsv or xlsx; inferred from the export path when omitted
    #[arg(long)]
    pub format: Option<String>,
}

impl ListArgs {
    fn query(&self, default_page_size: usize) -> TableQuery {
        let mut query = TableQuery::new(self.page_size.unwrap_or(default_page_size));
        query.search = self.search.clone();
        query.active_only = self.active_only;
        query.page = self.page;
        query
    }
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: None,
            active_only: false,
            export: None,
            format: None,
        }
    }
}

// ==================== Applications ====================

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    List(ListArgs),
    Show { app_code: String },
    Create(AppFields),
    /// Update an application; omitted fields keep their current value
    Update(AppFields),
    Delete { app_code: String },
}

#[derive(Debug, Args)]
pub struct AppFields {
    #[arg(long = "code")]
    pub app_code: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub login_url: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

impl AppFields {
    fn apply(self, mut req: ApplicationRequest) -> ApplicationRequest {
        req.app_code = self.app_code;
        if let Some(v) = self.name {
            req.app_name = v;
        }
        req.app_title = self.title.or(req.app_title);
        req.description = self.description.or(req.description);
        req.base_url = self.base_url.or(req.base_url);
        req.login_url = self.login_url.or(req.login_url);
        if let Some(v) = self.active {
            req.is_active = v;
        }
        req
    }
}

// ==================== Roles ====================

#[derive(Debug, Subcommand)]
pub enum RolesCommand {
    List {
        #[arg(long)]
        app: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
    Show { app_code: String, role_code: String },
    Create(RoleFields),
    /// Update a role; omitted fields keep their current value
    Update(RoleFields),
    Delete { app_code: String, role_code: String },
}

#[derive(Debug, Args)]
pub struct RoleFields {
    #[arg(long = "app")]
    pub app_code: String,
    #[arg(long = "code")]
    pub role_code: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub home_url: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

impl RoleFields {
    fn apply(self, mut req: AppRoleRequest) -> AppRoleRequest {
        req.app_code = self.app_code;
        req.role_code = self.role_code;
        if let Some(v) = self.name {
            req.role_name = v;
        }
        req.description = self.description.or(req.description);
        req.home_url = self.home_url.or(req.home_url);
        if let Some(v) = self.active {
            req.is_active = v;
        }
        req
    }
}

// ==================== Functions ====================

#[derive(Debug, Subcommand)]
pub enum FunctionsCommand {
    List {
        #[arg(long)]
        app: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
    Show { app_code: String, function_code: String },
    Create(FunctionFields),
    /// Update a function; omitted fields keep their current value
    Update(FunctionFields),
    Delete { app_code: String, function_code: String },
}

#[derive(Debug, Args)]
pub struct FunctionFields {
    #[arg(long = "app")]
    pub app_code: String,
    #[arg(long = "code")]
    pub function_code: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

impl FunctionFields {
    fn apply(self, mut req: AppFunctionRequest) -> AppFunctionRequest {
        req.app_code = self.app_code;
        req.function_code = self.function_code;
        if let Some(v) = self.name {
            req.function_name = v;
        }
        req.description = self.description.or(req.description);
        req.function_url = self.url.or(req.function_url);
        if let Some(v) = self.active {
            req.is_active = v;
        }
        req
    }
}

// ==================== RBAC ====================

#[derive(Debug, Subcommand)]
pub enum RbacCommand {
    List {
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Function codes currently assigned to a role
    Assigned { app_code: String, role_code: String },
    /// Edit the functions granted to a role and save the complete set
    Assign {
        app_code: String,
        role_code: String,
        /// Start from this set instead of the currently assigned functions
        #[arg(long, value_delimiter = ',')]
        set: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        check: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        uncheck: Vec<String>,
        /// Show the resulting set without saving
        #[arg(long)]
        dry_run: bool,
    },
    Delete { rbac_code: String },
}

// ==================== Grants ====================

#[derive(Debug, Subcommand)]
pub enum GrantsCommand {
    List {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        app: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
    Create(GrantFields),
    Delete(GrantFields),
    /// Roles that can be granted for an application
    Roles { app_code: String },
    /// Site/domain/factory options
    Facilities,
}

#[derive(Debug, Args)]
pub struct GrantFields {
    /// User ID, or a prefix resolved through the user directory
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub app: String,
    #[arg(long)]
    pub role: String,
    #[arg(long)]
    pub site: String,
    #[arg(long)]
    pub domain: String,
    #[arg(long)]
    pub factory: String,
}

impl GrantFields {
    fn into_request(self, user_id: String) -> GrantRequest {
        GrantRequest {
            user_id,
            app_code: self.app,
            role_code: self.role,
            site_code: self.site,
            domain_code: self.domain,
            factory_code: self.factory,
        }
    }
}

// ==================== Users / review ====================

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// Suggest user IDs for a partial value
    Search { partial: String },
}

#[derive(Debug, Subcommand)]
pub enum ReviewCommand {
    Options,
    Download {
        #[arg(long)]
        app: String,
        #[arg(long, default_value = "xlsx")]
        format: String,
        /// Target file or directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

/// 命令执行上下文
pub struct Context {
    pub config: AppConfig,
    pub services: Services,
}

impl Cli {
    pub async fn run(self, ctx: &Context) -> Result<(), ConsoleError> {
        debug!(command = ?self.command, "Running command");
        match self.command {
            Command::Apps(cmd) => run_apps(cmd, ctx).await,
            Command::Roles(cmd) => run_roles(cmd, ctx).await,
            Command::Functions(cmd) => run_functions(cmd, ctx).await,
            Command::Rbac(cmd) => run_rbac(cmd, ctx).await,
            Command::Grants(cmd) => run_grants(cmd, ctx).await,
            Command::Users(cmd) => run_users(cmd, ctx).await,
            Command::Whoami => {
                let user = ctx.services.users.current().await?;
                println!("{}", user.user_id);
                if let Some(name) = &user.user_name {
                    println!("name:  {}", name);
                }
                if let Some(email) = &user.email {
                    println!("email: {}", email);
                }
                if !user.roles.is_empty() {
                    println!("roles: {}", user.roles.join(", "));
                }
                Ok(())
            }
            Command::Review(cmd) => run_review(cmd, ctx).await,
        }
    }
}

async fn run_apps(cmd: AppsCommand, ctx: &Context) -> Result<(), ConsoleError> {
    let apps = &ctx.services.applications;
    match cmd {
        AppsCommand::List(args) => show_list(ctx, &args, "applications", || apps.list()).await,
        AppsCommand::Show { app_code } => show_one(&apps.get(&app_code).await?),
        AppsCommand::Create(fields) => {
            let req = fields.apply(ApplicationRequest {
                app_code: String::new(),
                app_name: String::new(),
                app_title: None,
                description: None,
                base_url: None,
                login_url: None,
                is_active: true,
            });
            apps.create(&req).await?;
            Notice::success(format!("Application {} created", req.app_code)).emit();
            show_list(ctx, &ListArgs::default(), "applications", || apps.list()).await
        }
        AppsCommand::Update(fields) => {
            let current = apps.get(&fields.app_code).await?;
            let req = fields.apply(ApplicationRequest::from(&current));
            apps.update(&current.app_code, &req).await?;
            Notice::success(format!("Application {} updated", req.app_code)).emit();
            show_list(ctx, &ListArgs::default(), "applications", || apps.list()).await
        }
        AppsCommand::Delete { app_code } => {
            apps.delete(&app_code).await?;
            Notice::success(format!("Application {} deleted", app_code)).emit();
            show_list(ctx, &ListArgs::default(), "applications", || apps.list()).await
        }
    }
}

async fn run_roles(cmd: RolesCommand, ctx: &Context) -> Result<(), ConsoleError> {
    let roles = &ctx.services.roles;
    match cmd {
        RolesCommand::List { app, list } => {
            show_list(ctx, &list, "app_roles", || roles.list(app.as_deref())).await
        }
        RolesCommand::Show { app_code, role_code } => show_one(&roles.get(&app_code, &role_code).await?),
        RolesCommand::Create(fields) => {
            let req = fields.apply(AppRoleRequest {
                app_code: String::new(),
                role_code: String::new(),
                role_name: String::new(),
                description: None,
                home_url: None,
                is_active: true,
            });
            roles.create(&req).await?;
            Notice::success(format!("Role {}/{} created", req.app_code, req.role_code)).emit();
            show_list(ctx, &ListArgs::default(), "app_roles", || roles.list(Some(req.app_code.as_str()))).await
        }
        RolesCommand::Update(fields) => {
            let current = roles.get(&fields.app_code, &fields.role_code).await?;
            let req = fields.apply(AppRoleRequest::from(&current));
            roles.update(&req).await?;
            Notice::success(format!("Role {}/{} updated", req.app_code, req.role_code)).emit();
            show_list(ctx, &ListArgs::default(), "app_roles", || roles.list(Some(req.app_code.as_str()))).await
        }
        RolesCommand::Delete { app_code, role_code } => {
            roles.delete(&app_code, &role_code).await?;
            Notice::success(format!("Role {}/{} deleted", app_code, role_code)).emit();
            show_list(ctx, &ListArgs::default(), "app_roles", || roles.list(Some(app_code.as_str()))).await
        }
    }
}

async fn run_functions(cmd: FunctionsCommand, ctx: &Context) -> Result<(), ConsoleError> {
    let functions = &ctx.services.functions;
    match cmd {
        FunctionsCommand::List { app, list } => {
            show_list(ctx, &list, "app_functions", || functions.list(app.as_deref())).await
        }
        FunctionsCommand::Show { app_code, function_code } => {
            show_one(&functions.get(&app_code, &function_code).await?)
        }
        FunctionsCommand::Create(fields) => {
            let req = fields.apply(AppFunctionRequest {
                app_code: String::new(),
                function_code: String::new(),
                function_name: String::new(),
                description: None,
                function_url: None,
                is_active: true,
            });
            functions.create(&req).await?;
            Notice::success(format!("Function {}/{} created", req.app_code, req.function_code)).emit();
            show_list(ctx, &ListArgs::default(), "app_functions", || functions.list(Some(req.app_code.as_str()))).await
        }
        FunctionsCommand::Update(fields) => {
            let current = functions.get(&fields.app_code, &fields.function_code).await?;
            let req = fields.apply(AppFunctionRequest::from(&current));
            functions.update(&req).await?;
            Notice::success(format!("Function {}/{} updated", req.app_code, req.function_code)).emit();
            show_list(ctx, &ListArgs::default(), "app_functions", || functions.list(Some(req.app_code.as_str()))).await
        }
        FunctionsCommand::Delete { app_code, function_code } => {
            functions.delete(&app_code, &function_code).await?;
            Notice::success(format!("Function {}/{} deleted", app_code, function_code)).emit();
            show_list(ctx, &ListArgs::default(), "app_functions", || functions.list(Some(app_code.as_str()))).await
        }
    }
}

async fn run_rbac(cmd: RbacCommand, ctx: &Context) -> Result<(), ConsoleError> {
    let rbac = &ctx.services.rbac;
    match cmd {
        RbacCommand::List { app, role, list } => {
            show_list(ctx, &list, "rbac", || rbac.list(app.as_deref(), role.as_deref())).await
        }
        RbacCommand::Assigned { app_code, role_code } => {
            let codes = rbac.assigned(&app_code, &role_code).await?;
            if codes.is_empty() {
                Notice::info(format!("No functions assigned to {}/{}", app_code, role_code)).emit();
            }
            for code in codes {
                println!("{}", code);
            }
            Ok(())
        }
        RbacCommand::Assign {
            app_code,
            role_code,
            set,
            check,
            uncheck,
            dry_run,
        } => {
            let mut editor = AssignmentEditor::new(Arc::clone(rbac));
            editor.select_application(Some(app_code.as_str()));
            editor.select_role(Some(role_code.as_str()));
            editor.settle().await;

            // 基线未知时增量修改会被当作完整集合提交，覆盖服务端已有分配
            if let Some(reason) = editor.load_error() {
                if set.is_none() {
                    return Err(ConsoleError::invalid_state(&format!(
                        "Could not load the functions assigned to {}/{} ({}); pass --set with the complete list",
                        app_code, role_code, reason
                    )));
                }
                warn!(app_code = %app_code, role_code = %role_code, "Assigned functions unknown, using --set as the complete list");
            }

            if let Some(set) = set {
                editor.set_desired(set)?;
            }
            for code in &uncheck {
                editor.toggle(code, false)?;
            }
            for code in &check {
                editor.toggle(code, true)?;
            }

            let (added, removed) = editor.preview();
            println!(
                "{}/{}: {}",
                app_code,
                role_code,
                editor.desired().iter().cloned().collect::<Vec<_>>().join(", ")
            );
            if !added.is_empty() {
                println!("  + {}", added.join(", "));
            }
            if !removed.is_empty() {
                println!("  - {}", removed.join(", "));
            }

            if dry_run {
                Notice::info("Dry run, nothing saved").emit();
                return Ok(());
            }

            editor.submit().await?;
            Notice::success(format!("Functions for {}/{} saved", app_code, role_code)).emit();
            show_list(ctx, &ListArgs::default(), "rbac", || {
                rbac.list(Some(app_code.as_str()), Some(role_code.as_str()))
            })
            .await
        }
        RbacCommand::Delete { rbac_code } => {
            rbac.delete(&rbac_code).await?;
            Notice::success(format!("Assignment {} deleted", rbac_code)).emit();
            show_list(ctx, &ListArgs::default(), "rbac", || rbac.list(None, None)).await
        }
    }
}

async fn run_grants(cmd: GrantsCommand, ctx: &Context) -> Result<(), ConsoleError> {
    let grants = &ctx.services.grants;
    match cmd {
        GrantsCommand::List { user, app, list } => {
            show_list(ctx, &list, "user_authorize", || {
                grants.list(user.as_deref(), app.as_deref())
            })
            .await
        }
        GrantsCommand::Create(fields) => {
            let user_id = resolve_user(ctx, &fields.user).await?;
            let req = fields.into_request(user_id);
            grants.create(&req).await?;
            Notice::success(format!(
                "Granted {}/{} to {}",
                req.app_code, req.role_code, req.user_id
            ))
            .emit();
            show_list(ctx, &ListArgs::default(), "user_authorize", || {
                grants.list(Some(req.user_id.as_str()), None)
            })
            .await
        }
        GrantsCommand::Delete(fields) => {
            let user_id = fields.user.clone();
            let req = fields.into_request(user_id);
            grants.delete(&req).await?;
            Notice::success(format!(
                "Revoked {}/{} from {}",
                req.app_code, req.role_code, req.user_id
            ))
            .emit();
            show_list(ctx, &ListArgs::default(), "user_authorize", || {
                grants.list(Some(req.user_id.as_str()), None)
            })
            .await
        }
        GrantsCommand::Roles { app_code } => {
            let roles = grants.role_options(&app_code).await?;
            print_all(&roles);
            Ok(())
        }
        GrantsCommand::Facilities => {
            let facilities = grants.facilities().await?;
            print_all(&facilities);
            Ok(())
        }
    }
}

async fn run_users(cmd: UsersCommand, ctx: &Context) -> Result<(), ConsoleError> {
    match cmd {
        UsersCommand::Search { partial } => {
            let mut widget = lookup_widget(ctx);
            widget.input(&partial);
            let suggestions = widget.settle().await;
            if suggestions.is_empty() {
                Notice::info(format!("No users match {}", partial)).emit();
            }
            for suggestion in suggestions {
                println!("{}", suggestion.label);
            }
            Ok(())
        }
    }
}

async fn run_review(cmd: ReviewCommand, ctx: &Context) -> Result<(), ConsoleError> {
    let review = &ctx.services.review;
    match cmd {
        ReviewCommand::Options => {
            let options = review.options().await?;
            for (group, items) in &options.groups {
                println!("{}:", group);
                for item in items {
                    println!("  {}  {}", item.value, item.label);
                }
            }
            Ok(())
        }
        ReviewCommand::Download { app, format, output } => {
            let path = review.download(&app, &format, &output).await?;
            Notice::success(format!("Saved {}", path.display())).emit();
            Ok(())
        }
    }
}

fn lookup_widget(ctx: &Context) -> Autocomplete<crate::services::UserService> {
    Autocomplete::with_debounce(
        Arc::clone(&ctx.services.users),
        std::time::Duration::from_millis(ctx.config.ui.debounce_ms),
    )
}

/// 通过用户目录把输入解析为确定的用户 ID
///
/// 唯一完全匹配直接采用；只有一个候选时采用该候选；否则列出候选并拒绝。
async fn resolve_user(ctx: &Context, typed: &str) -> Result<String, ConsoleError> {
    let mut widget = lookup_widget(ctx);
    widget.input(typed);
    widget.settle().await;

    if let Some(reason) = widget.lookup_error() {
        return Err(ConsoleError::invalid_state(&format!(
            "User directory lookup for {} failed ({}); nothing was submitted",
            typed, reason
        )));
    }

    if let KeyOutcome::Accepted(chosen) = widget.key(Key::Enter) {
        return Ok(chosen.value);
    }
    if widget.suggestions().len() == 1 {
        if let Some(chosen) = widget.select(0) {
            return Ok(chosen.value);
        }
    }
    if widget.suggestions().is_empty() {
        warn!(user = %typed, "User not found in directory, submitting as typed");
        return Ok(typed.trim().to_string());
    }

    for suggestion in widget.suggestions() {
        eprintln!("  {}", suggestion.label);
    }
    Err(ConsoleError::invalid_state(&format!(
        "{} matches several users; pass the full user ID",
        typed
    )))
}

/// 拉取、过滤、分页后打印，或按参数导出
async fn show_list<T, F, Fut>(ctx: &Context, args: &ListArgs, prefix: &str, fetch: F) -> Result<(), ConsoleError>
where
    T: Tabular,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ConsoleError>>,
{
    let mut view = ListView::new(args.query(ctx.config.ui.page_size));
    view.refresh(fetch).await?;

    match &args.export {
        Some(target) => {
            let format = match &args.format {
                Some(f) => f.parse()?,
                None => ExportFormat::from_path(target).unwrap_or(ExportFormat::Xlsx),
            };
            let path = export_target(ctx, target, prefix, format);
            let options = ExportOptions {
                format,
                delimiter: ctx.config.export.delimiter(),
                sheet_name: prefix.to_string(),
            };
            let written = export_rows(&view.filtered(), &path, &options)?;
            Notice::success(format!("Exported to {}", written.display())).emit();
        }
        None => println!("{}", render_page(&view.page())),
    }
    Ok(())
}

/// 目标是目录时在其中生成默认文件名；相对路径基于配置的导出目录
fn export_target(ctx: &Context, target: &Path, prefix: &str, format: ExportFormat) -> PathBuf {
    let base = if target.is_absolute() {
        target.to_path_buf()
    } else {
        Path::new(&ctx.config.export.directory).join(target)
    };
    if base.is_dir() {
        base.join(default_file_name(prefix, format))
    } else {
        base
    }
}

fn show_one<T: Tabular>(row: &T) -> Result<(), ConsoleError> {
    for (header, cell) in T::headers().iter().zip(row.cells()) {
        println!("{:<14} {}", format!("{}:", header), cell);
    }
    Ok(())
}

fn print_all<T: Tabular>(rows: &[T]) {
    let refs: Vec<&T> = rows.iter().collect();
    print!("{}", render_table(&refs));
}
