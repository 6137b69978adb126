//! `nebula` command-line front-end.

use std::io::Write;
use std::path::{Path, PathBuf};

use authoring::{AuthoringWorkflow, VideoState};
use backend::{ContactRequest, FullBackend, SignupRequest};
use checkout::{PaymentMethod, PaymentOutcome};
use clap::{Args, Parser, Subcommand};
use common::{CartItemId, CategoryId, CourseId, RoleId, SectionId, TopicId, UserId};
use domain::{
    Amount, CheckoutSummary, CourseDraft, DurationFilter, FileUpload, Notice, RoleAssignment,
    RoleDraft,
};
use rust_decimal::Decimal;

use crate::catalog::PAGINATION_WINDOW;
use crate::console::ConsoleGateway;
use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::storage::TokenStore;

#[derive(Debug, Parser)]
#[command(name = "nebula", version, about = "Command-line client for the e-learning platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "NEBULA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "NEBULA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the signed-in user
    Profile,
    /// Open a support ticket
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Browse the course catalog
    Courses(CoursesArgs),
    /// List course categories
    Categories,
    /// Show enrollment and cart status of a course
    Status { course_id: CourseId },
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Review the checkout summary or pay
    Checkout {
        #[command(subcommand)]
        action: CheckoutCommand,
    },
    /// Author the content tree of a course
    Content {
        course_id: CourseId,
        #[command(subcommand)]
        action: ContentCommand,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },
    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommand,
    },
    /// Manage roles and users
    Role {
        #[command(subcommand)]
        action: RoleCommand,
    },
}

#[derive(Debug, Args)]
pub struct CoursesArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub category: Option<CategoryId>,
    #[arg(long)]
    pub keyword: Option<String>,
    /// One of 0-5, 5-10 or 10+ (hours)
    #[arg(long)]
    pub duration: Option<DurationFilter>,
    /// Use the admin listing
    #[arg(long)]
    pub admin: bool,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    Show,
    Add { course_id: CourseId },
    Remove { item_id: CartItemId },
}

#[derive(Debug, Subcommand)]
pub enum CheckoutCommand {
    /// Show the payable amount
    Summary {
        #[arg(long)]
        coupon: Option<String>,
    },
    /// Create an order and complete the payment in the console
    Pay {
        #[arg(long)]
        coupon: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ContentCommand {
    Show,
    AddSection {
        title: String,
        #[arg(long, default_value_t = 1)]
        order: u32,
        #[arg(long, default_value = "")]
        description: String,
    },
    AddTopic {
        #[arg(long)]
        section: SectionId,
        title: String,
        #[arg(long)]
        video: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 10)]
        duration: u32,
        #[arg(long, default_value_t = 1)]
        order: u32,
    },
    DeleteSection {
        section_id: SectionId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    DeleteTopic {
        section_id: SectionId,
        topic_id: TopicId,
        #[arg(long)]
        yes: bool,
    },
    /// Resolve the playable URL of a topic's video
    Video { topic_id: TopicId },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    Add { name: String },
}

#[derive(Debug, Args)]
pub struct CourseArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub instructor: String,
    #[arg(long)]
    pub price: Decimal,
    #[arg(long)]
    pub discounted_price: Option<Decimal>,
    /// Length in hours
    #[arg(long, default_value_t = 0)]
    pub duration: u32,
    #[arg(long)]
    pub category: Option<CategoryId>,
    /// Cover image; required for new courses
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CourseCommand {
    Add(CourseArgs),
    Edit {
        course_id: CourseId,
        #[command(flatten)]
        course: CourseArgs,
    },
    Delete {
        course_id: CourseId,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 500)]
        level: i32,
    },
    List,
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Assign {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        role: RoleId,
    },
}

/// Executes one command.
pub async fn run<B, S>(cli: Cli, ctx: &AppContext<B, S>) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    match cli.command {
        Command::Login { email, password } => {
            let session = ctx.session().login(&email, &password).await?;
            match session.user {
                Some(user) => println!("Signed in as {} <{}>", user.full_name(), user.email),
                None => println!("Signed in"),
            }
        }
        Command::Logout => {
            ctx.session().logout().await?;
            println!("Signed out");
        }
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            let request = SignupRequest {
                first_name,
                last_name,
                email,
                password,
            };
            ctx.session().register(&request).await?;
            println!("Account created. Sign in with `nebula login`.");
        }
        Command::Contact {
            name,
            email,
            message,
        } => {
            let request = ContactRequest {
                name,
                email,
                message,
            };
            ctx.contact(&request).await?;
            println!("Ticket submitted. We'll be in touch soon.");
        }
        Command::Profile => {
            ctx.reload().await?;
            let session = ctx.session().current();
            let user = session
                .user
                .as_ref()
                .ok_or(AppError::NotAuthenticated("Please log in."))?;
            println!("{} <{}>", user.full_name(), user.email);
            for role in &user.roles {
                println!("  role: {} (level {})", role.role.name, role.role.level);
            }
            if session.can_view_admin_consoles() {
                println!("  admin consoles available");
            }
        }
        Command::Courses(args) => courses(ctx, args).await?,
        Command::Categories => {
            let mut catalog = ctx.catalog();
            catalog.load_categories().await?;
            for category in catalog.categories() {
                println!("{:>6}  {}", category.id, category.name);
            }
        }
        Command::Status { course_id } => {
            let status = ctx.course_status(course_id).await;
            println!("enrolled: {}  in cart: {}", status.enrolled, status.in_cart);
        }
        Command::Cart { action } => cart(ctx, action).await?,
        Command::Checkout { action } => checkout(ctx, action).await?,
        Command::Content { course_id, action } => content(ctx, course_id, action).await?,
        Command::Category {
            action: CategoryCommand::Add { name },
        } => {
            let mut admin = ctx.admin()?;
            let category = admin.add_category(&name).await?;
            print_notices(admin.take_notices());
            println!("category id: {}", category.id);
        }
        Command::Course { action } => course(ctx, action).await?,
        Command::Role { action } => role(ctx, action).await?,
    }
    Ok(())
}

async fn courses<B, S>(ctx: &AppContext<B, S>, args: CoursesArgs) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    let mut catalog = if args.admin {
        ctx.admin_catalog()?
    } else {
        ctx.catalog()
    };
    catalog.set_category(args.category).await?;
    if let Some(keyword) = &args.keyword {
        catalog.set_keyword(keyword).await?;
    }
    if args.duration.is_some() {
        catalog.set_duration(args.duration).await?;
    }
    if args.page > 1 && !catalog.go_to_page(args.page).await? {
        return Err(AppError::Usage(format!(
            "page {} is out of range (1-{})",
            args.page,
            catalog.page().page_count()
        )));
    }

    for course in catalog.courses() {
        let price = match course.discounted_price {
            Some(discounted) => format!("{discounted} (was {})", course.price),
            None => course.price.to_string(),
        };
        println!("{:>6}  {}  {}h  {}", course.id, course.title, course.duration, price);
    }
    let pagination = catalog.pagination();
    let pages: Vec<String> = pagination
        .window(PAGINATION_WINDOW)
        .into_iter()
        .map(|p| {
            if p == pagination.current {
                format!("[{p}]")
            } else {
                p.to_string()
            }
        })
        .collect();
    println!("page {}", pages.join(" "));
    Ok(())
}

async fn cart<B, S>(ctx: &AppContext<B, S>, action: CartCommand) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    let mut view = ctx.cart();
    match action {
        CartCommand::Show => view.load().await?,
        CartCommand::Add { course_id } => {
            let title = ctx
                .backend()
                .course_detail(course_id)
                .await
                .map(|c| c.title)
                .unwrap_or_else(|_| course_id.to_string());
            view.add(course_id, &title).await?;
            view.load().await?;
        }
        CartCommand::Remove { item_id } => view.remove(item_id).await?,
    }
    print_notices(view.take_notices());

    match view.cart() {
        Some(cart) if !cart.is_empty() => {
            for item in &cart.cart_items {
                println!(
                    "{:>6}  {}  {}",
                    item.id,
                    item.course.title,
                    item.course.effective_price()
                );
            }
            println!("subtotal: {}", cart.subtotal);
            println!("discount: {}", cart.discount_amount);
            println!("total:    {}", cart.total_price);
        }
        _ => println!("Your cart is empty."),
    }
    Ok(())
}

async fn checkout<B, S>(ctx: &AppContext<B, S>, action: CheckoutCommand) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    let mut checkout = ctx.checkout(ConsoleGateway::stdio());
    checkout.load().await?;
    let (coupon, pay) = match action {
        CheckoutCommand::Summary { coupon } => (coupon, false),
        CheckoutCommand::Pay { coupon } => (coupon, true),
    };
    if let Some(code) = coupon {
        checkout.apply_coupon(&code).await?;
    }
    print_notices(checkout.take_notices());
    match checkout.summary() {
        Some(summary) => print_summary(summary),
        None => println!("Your cart is empty."),
    }
    if !pay {
        return Ok(());
    }

    checkout.select_payment_method(Some(PaymentMethod::Gateway));
    let outcome = checkout.initiate_payment().await;
    print_notices(checkout.take_notices());
    match outcome? {
        PaymentOutcome::Enrolled(message) => println!("{message}"),
        PaymentOutcome::Dismissed => println!("Payment cancelled."),
    }
    Ok(())
}

fn print_summary(summary: &CheckoutSummary) {
    println!("cart total: {}", summary.cart_total);
    if let Some(code) = summary.applied_coupon() {
        println!("coupon {code}: -{}", summary.coupon_amount);
    }
    println!("tax (GST):  {}", summary.tax_gst);
    println!("payable:    {}", summary.checkout_price);
}

async fn content<B, S>(ctx: &AppContext<B, S>, course_id: CourseId, action: ContentCommand) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    let mut workflow = ctx.authoring(course_id);
    workflow.load().await?;
    match action {
        ContentCommand::Show => {}
        ContentCommand::AddSection {
            title,
            order,
            description,
        } => {
            let form = workflow.section_form_mut();
            form.title = title;
            form.section_order = order;
            form.description = description;
            workflow.create_section().await?;
        }
        ContentCommand::AddTopic {
            section,
            title,
            video,
            description,
            duration,
            order,
        } => {
            let video = read_upload(&video).await?;
            let form = workflow.topic_form_mut();
            form.select_section(Some(section));
            form.title = title;
            form.description = description;
            form.duration_minutes = duration;
            form.topic_order = order;
            form.attach_video(video);
            workflow.create_topic().await?;
        }
        ContentCommand::DeleteSection { section_id, yes } => {
            workflow.delete_section(section_id, &prompt(yes)).await?;
        }
        ContentCommand::DeleteTopic {
            section_id,
            topic_id,
            yes,
        } => {
            workflow
                .delete_topic(section_id, topic_id, &prompt(yes))
                .await?;
        }
        ContentCommand::Video { topic_id } => {
            let viewer = workflow.open_video(topic_id).await?;
            return match viewer.state() {
                VideoState::Ready(url) => {
                    println!("{url}");
                    Ok(())
                }
                VideoState::Failed(message) => Err(AppError::Request(message.clone())),
                VideoState::Loading => Ok(()),
            };
        }
    }
    print_notices(workflow.take_notices());
    print_tree(&workflow);
    Ok(())
}

fn print_tree<B: backend::ContentApi>(workflow: &AuthoringWorkflow<B>) {
    let Some(course) = workflow.view().course() else {
        return;
    };
    println!("{} ({})", course.title, course.id);
    for section in course.ordered_sections() {
        println!("  {}. {} [section {}]", section.section_order, section.title, section.id);
        for topic in section.ordered_topics() {
            let lock = if topic.is_locked() { " (locked)" } else { "" };
            println!(
                "     {}. {} [topic {}]{lock}",
                topic.topic_order, topic.title, topic.id
            );
        }
    }
}

async fn course<B, S>(ctx: &AppContext<B, S>, action: CourseCommand) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    let mut admin = ctx.admin()?;
    match action {
        CourseCommand::Add(args) => {
            let draft = course_draft(args).await?;
            admin.add_course(&draft).await?;
        }
        CourseCommand::Edit { course_id, course } => {
            let draft = course_draft(course).await?;
            if let Some(updated) = admin.edit_course(course_id, &draft).await? {
                println!("{:>6}  {}  {}", updated.id, updated.title, updated.effective_price());
            }
        }
        CourseCommand::Delete { course_id, yes } => {
            if !admin.delete_course(course_id, &prompt(yes)).await? {
                println!("Cancelled.");
            }
        }
    }
    print_notices(admin.take_notices());
    Ok(())
}

async fn course_draft(args: CourseArgs) -> Result<CourseDraft> {
    let image = match &args.image {
        Some(path) => Some(read_upload(path).await?),
        None => None,
    };
    Ok(CourseDraft {
        title: args.title,
        description: args.description,
        instructor_name: args.instructor,
        price: Amount::new(args.price),
        discounted_price: args.discounted_price.map(Amount::new),
        duration: args.duration,
        category_id: args.category,
        image,
    })
}

async fn role<B, S>(ctx: &AppContext<B, S>, action: RoleCommand) -> Result<()>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    let mut admin = ctx.admin()?;
    match action {
        RoleCommand::Add {
            name,
            description,
            level,
        } => {
            let role = admin
                .add_role(&RoleDraft {
                    name,
                    description,
                    level,
                })
                .await?;
            println!("role id: {}", role.id);
        }
        RoleCommand::List => {
            for role in admin.roles().await? {
                println!("{:>6}  {}  level {}", role.id, role.name, role.level);
            }
        }
        RoleCommand::Users { page } => {
            let directory = admin.users(page).await?;
            for user in &directory.users.content {
                println!("{:>6}  {}  <{}>", user.id, user.label(), user.email);
            }
            let pages: Vec<String> = directory.window().iter().map(u32::to_string).collect();
            println!("page {} of {}  ({})", directory.page, directory.users.page_count(), pages.join(" "));
        }
        RoleCommand::Assign { user, role } => {
            let roles = admin.roles().await?;
            let users = admin.users(1).await?.users.content;
            admin
                .assign_role(
                    RoleAssignment {
                        user_id: Some(user),
                        role_id: Some(role),
                    },
                    &roles,
                    &users,
                )
                .await?;
        }
    }
    print_notices(admin.take_notices());
    Ok(())
}

/// Reads a file picked for upload.
async fn read_upload(path: &Path) -> Result<FileUpload> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Usage(format!("not a file: {}", path.display())))?;
    Ok(FileUpload::new(file_name, content_type(path), bytes))
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Confirmation that is either pre-approved or asked on the terminal.
fn prompt(yes: bool) -> impl Fn(&str) -> bool {
    move |question: &str| {
        if yes {
            return true;
        }
        print!("{question} [y/N] ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer).is_ok()
            && matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

/// Errors are reported by the caller; only the other notices are printed.
fn print_notices(notices: Vec<Notice>) {
    for notice in notices.into_iter().filter(|n| !n.is_error()) {
        println!("{notice}");
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_content_add_topic() {
        let cli = Cli::try_parse_from([
            "nebula", "content", "7", "add-topic", "--section", "3", "Welcome", "--video",
            "intro.mp4",
        ])
        .unwrap();
        let Command::Content { course_id, action } = cli.command else {
            panic!("expected content command");
        };
        assert_eq!(course_id, CourseId::new(7));
        let ContentCommand::AddTopic {
            section,
            duration,
            order,
            ..
        } = action
        else {
            panic!("expected add-topic");
        };
        assert_eq!(section, SectionId::new(3));
        assert_eq!(duration, 10);
        assert_eq!(order, 1);
    }

    #[test]
    fn test_parse_duration_filter() {
        let cli = Cli::try_parse_from(["nebula", "courses", "--duration", "10+"]).unwrap();
        let Command::Courses(args) = cli.command else {
            panic!("expected courses command");
        };
        assert_eq!(args.duration, Some(DurationFilter::TenPlus));
        assert_eq!(args.page, 1);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a/lecture.MP4")), "video/mp4");
        assert_eq!(content_type(Path::new("cover.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("notes")), "application/octet-stream");
    }
}
