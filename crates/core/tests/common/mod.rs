#![allow(dead_code)]

use markscope_core::{DiscoveryConfig, DiscoveryEngine, Environment};
use markscope_php::PhpPlugin;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const SYNC_COMMAND: &str = r#"<?php
namespace App\Console\Command;

use Discovery\Attribute\Console\AsConsoleCommand;
use Illuminate\Console\Command;

#[AsConsoleCommand('app:sync')]
final class SyncCommand extends Command
{
}
"#;

pub const BASE_COMMAND: &str = r#"<?php
namespace App\Console\Command;

use Discovery\Attribute\Console\AsConsoleCommand;

#[AsConsoleCommand]
abstract class BaseCommand extends \Illuminate\Console\Command
{
}
"#;

pub const REPORT_COMMAND: &str = r#"<?php
namespace App\Console\Command;

use Discovery\Attribute\Console\AsConsoleCommand;

#[AsConsoleCommand(signature: 'app:report')]
class ReportCommand extends BaseCommand
{
}
"#;

pub const NOT_A_COMMAND: &str = r#"<?php
namespace App\Console\Command;

use Discovery\Attribute\Console\AsConsoleCommand;

#[AsConsoleCommand]
class Helper
{
}
"#;

pub const AUDIT_LISTENER: &str = r#"<?php
namespace App\Listener;

use App\Event\InvoicePaid;
use App\Event\InvoiceRefunded;
use Discovery\Attribute\Event\AsEventListener;

#[AsEventListener(InvoicePaid::class)]
final class AuditListener
{
    #[AsEventListener(event: InvoicePaid::class)]
    #[AsEventListener(event: InvoiceRefunded::class)]
    public function onPaid(InvoicePaid $event): void
    {
        $this->log($event);
    }

    #[AsEventListener(event: InvoicePaid::class)]
    private function log(object $event): void
    {
    }
}
"#;

pub const MAIL_LISTENER: &str = r#"<?php
namespace App\Listener;

use App\Event\InvoicePaid;
use Discovery\Attribute\Event\AsEventListener;

#[AsEventListener(event: InvoicePaid::class)]
class MailListener
{
}
"#;

pub const INVOICE_POLICY: &str = r#"<?php
namespace App\Policy;

use App\Model\Invoice;
use Discovery\Attribute\Auth\AsPolicy;

#[AsPolicy(model: Invoice::class)]
final class InvoicePolicy
{
}
"#;

pub const POLICY_CONTRACT: &str = r#"<?php
namespace App\Policy;

use Discovery\Attribute\Auth\AsPolicy;

#[AsPolicy(model: \App\Model\User::class)]
interface PolicyContract
{
}
"#;

pub const BROKEN_POLICY: &str = "<?php\nnamespace App\\Policy;\n\nclass BrokenPolicy {\n";

pub const USER_POLICY: &str = r#"<?php
namespace App\Policy;

use Discovery\Attribute\Auth\AsPolicy;

#[AsPolicy('App\Model\User')]
class UserPolicy
{
}
"#;

pub const MALFORMED_POLICY: &str = r#"<?php
namespace App\Policy;

use Discovery\Attribute\Auth\AsPolicy;

#[AsPolicy]
class OrphanPolicy
{
}
"#;

pub const NAV_COMPONENT: &str = r#"<?php
namespace App\Presentation\Component;

use Discovery\Attribute\Component\AsComponent;

#[AsComponent(alias: 'nav-bar')]
final class Navigation
{
}
"#;

pub const SUBSCRIBER: &str = r#"<?php
namespace App\Subscriber;

use Discovery\Attribute\Event\AsEventSubscriber;

#[AsEventSubscriber]
final class BillingSubscriber
{
}
"#;

pub const INVOICE_MODEL: &str = r#"<?php
namespace App\BoundedContexts\Finance\Application\Persistence\Model;

use App\BoundedContexts\Finance\Domain\Invoice as InvoiceEntity;
use Discovery\Attribute\Persistence\UseDomainEntity;
use Discovery\Attribute\Persistence\UseReadModel;
use Illuminate\Database\Eloquent\Model;
use Illuminate\Database\Eloquent\SoftDeletes;

#[UseDomainEntity(InvoiceEntity::class)]
#[UseReadModel(excludeFields: ['internalNote'], fieldMappings: ['amount' => 'total'])]
final class Invoice extends Model
{
    use SoftDeletes;

    protected $fillable = ['amount', 'internalNote', 'customer_id'];

    protected $casts = [
        'amount' => 'decimal:2',
        'customer_id' => 'integer',
    ];
}
"#;

pub const BASE_MODEL: &str = r#"<?php
namespace App\Shared\Application\Persistence\Model;

use Illuminate\Database\Eloquent\Model;

abstract class BaseModel extends Model
{
}
"#;

pub const CUSTOMER_MODEL: &str = r#"<?php
namespace App\Shared\Application\Persistence\Model;

use App\Shared\Application\ReadModel\CustomerView;
use Discovery\Attribute\Persistence\UseReadModel;

#[UseReadModel(readModel: CustomerView::class, customMappings: ['tags' => 'array'])]
class Customer extends BaseModel
{
    protected $fillable = ['name', 'tags'];
}
"#;

pub const UNMARKED_MODEL: &str = r#"<?php
namespace App\Shared\Application\Persistence\Model;

class Setting extends BaseModel
{
    protected $fillable = ['key'];
}
"#;

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A project exercising every domain, without manifest or cache.
pub fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/Console/Command/SyncCommand.php", SYNC_COMMAND);
    write(root, "src/Console/Command/BaseCommand.php", BASE_COMMAND);
    write(root, "src/Console/Command/ReportCommand.php", REPORT_COMMAND);
    write(root, "src/Console/Command/Helper.php", NOT_A_COMMAND);
    write(root, "src/Listener/AuditListener.php", AUDIT_LISTENER);
    write(root, "src/Listener/MailListener.php", MAIL_LISTENER);
    write(root, "src/Policy/InvoicePolicy.php", INVOICE_POLICY);
    write(root, "src/Policy/PolicyContract.php", POLICY_CONTRACT);
    write(root, "src/Policy/BrokenPolicy.php", BROKEN_POLICY);
    write(root, "src/Policy/UserPolicy.php", USER_POLICY);
    write(root, "src/Presentation/Component/Navigation.php", NAV_COMPONENT);
    write(root, "src/Subscriber/BillingSubscriber.php", SUBSCRIBER);
    write(
        root,
        "src/BoundedContexts/Finance/Application/Persistence/Model/Invoice.php",
        INVOICE_MODEL,
    );
    write(root, "src/Shared/Application/Persistence/Model/BaseModel.php", BASE_MODEL);
    write(root, "src/Shared/Application/Persistence/Model/Customer.php", CUSTOMER_MODEL);
    write(root, "src/Shared/Application/Persistence/Model/Setting.php", UNMARKED_MODEL);
    dir
}

pub fn local_config(root: &Path) -> DiscoveryConfig {
    DiscoveryConfig::new(root).with_environment(Environment::Local)
}

pub fn engine(config: DiscoveryConfig) -> DiscoveryEngine {
    DiscoveryEngine::new(config, Arc::new(PhpPlugin::new()))
}
